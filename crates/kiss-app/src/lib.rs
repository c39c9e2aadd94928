// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod categories;
pub mod export;
pub mod fields;
pub mod filters;
pub mod forms;
pub mod ids;
pub mod import;
pub mod model;
pub mod state;

pub use ids::*;
pub use model::*;
pub use state::*;
