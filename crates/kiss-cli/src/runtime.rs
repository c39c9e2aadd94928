// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use kiss_app::categories::{self, CategoryTree};
use kiss_app::export::{self, ExportFormat};
use kiss_app::fields::{FieldSequencer, export_fields};
use kiss_app::import::{RowResult, import_rows, parse_item_csv};
use kiss_app::{ItemListCommand, ItemListState, ItemTab};
use kiss_client::Client;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Runs CLI actions against a live server and writes plain-text results.
pub struct ApiRuntime {
    client: Client,
}

impl ApiRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn check(&self, out: &mut impl Write) -> Result<()> {
        let count = self.client.ping()?;
        writeln!(
            out,
            "server {} is reachable ({count} categories)",
            self.client.base_url()
        )?;
        Ok(())
    }

    pub fn categories(&self, search: Option<&str>, out: &mut impl Write) -> Result<()> {
        let fetched = self.client.list_categories()?;
        let dangling = categories::dangling_parents(&fetched);
        if !dangling.is_empty() {
            warn!(?dangling, "categories reference parents the server did not return");
        }

        let mut tree = CategoryTree::new(&fetched);
        match search {
            Some(term) => {
                let matches = categories::search(tree.nodes(), term);
                if matches.is_empty() {
                    writeln!(out, "no categories match {:?}", term.trim())?;
                }
                for node in matches {
                    write_category(out, categories::indentation(node.level), &node.category.name)?;
                }
            }
            None => {
                tree.expand_all();
                for row in tree.visible_rows() {
                    write_category(out, row.indent_px, &row.node.category.name)?;
                }
            }
        }
        Ok(())
    }

    pub fn items(&self, not_confirmed: bool, out: &mut impl Write) -> Result<()> {
        let mut state = ItemListState::default();
        if not_confirmed {
            state.dispatch(ItemListCommand::SwitchTab(ItemTab::NotConfirmed));
        }
        state.dispatch(ItemListCommand::BeginLoading);
        match self.client.list_items(None) {
            Ok(items) => {
                state.dispatch(ItemListCommand::ItemsLoaded(items));
            }
            Err(err) => {
                state.dispatch(ItemListCommand::LoadFailed(format!("{err:#}")));
                return Err(err);
            }
        }

        for item in state.visible_items() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                item.id,
                item.barcode,
                item.name,
                item.unit_price,
                item.status.as_str()
            )?;
        }
        if state.has_not_confirmed_items() {
            writeln!(
                out,
                "{} item(s) are not confirmed",
                state.not_confirmed_count()
            )?;
        }
        Ok(())
    }

    pub fn import(&mut self, path: &Path, out: &mut impl Write) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read import file {}", path.display()))?;
        let rows = parse_item_csv(&text).with_context(|| {
            format!(
                "{} is not a valid item import -- run `kiss --template` for the expected headers",
                path.display()
            )
        })?;

        let report = import_rows(&mut self.client, &rows, |progress| {
            info!(
                done = progress.done,
                total = progress.total,
                "import {}% complete",
                progress.percent
            );
        });

        writeln!(
            out,
            "imported {} of {} item(s)",
            report.created_count(),
            rows.len()
        )?;
        let failures = report.failures();
        for outcome in &failures {
            if let RowResult::Failed(message) = &outcome.result {
                writeln!(
                    out,
                    "row {} (barcode {}): {message}",
                    outcome.row, outcome.barcode
                )?;
            }
        }
        if !failures.is_empty() {
            bail!(
                "{} row(s) failed to import -- fix them and import only those rows again",
                failures.len()
            );
        }
        Ok(())
    }

    pub fn export(&self, path: &Path, out: &mut impl Write) -> Result<()> {
        let items = self.client.list_items(None)?;
        let sequencer = FieldSequencer::new(export_fields());
        let columns = sequencer.selected_names();
        let body = export::render(&items, &columns, ExportFormat::from_path(path))?;
        fs::write(path, body).with_context(|| format!("write export file {}", path.display()))?;
        info!(path = %path.display(), rows = items.len(), "export written");
        writeln!(out, "exported {} item(s) to {}", items.len(), path.display())?;
        Ok(())
    }
}

fn write_category(out: &mut impl Write, indent_px: usize, name: &str) -> Result<()> {
    // Two spaces per nesting level.
    let pad = indent_px / categories::INDENT_PX * 2;
    writeln!(out, "{:pad$}{name}", "")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ApiRuntime;
    use anyhow::{Result, anyhow};
    use kiss_client::Client;
    use kiss_testkit::temp_file;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Header, Response, Server};

    fn serve(replies: Vec<(&'static str, String)>) -> Result<(String, thread::JoinHandle<()>)> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            for (path, body) in replies {
                let request = server.recv().expect("request expected");
                assert!(
                    request.url().starts_with(path),
                    "unexpected url {}",
                    request.url()
                );
                let response = Response::from_string(body).with_header(
                    Header::from_bytes("Content-Type", "application/json")
                        .expect("valid content type header"),
                );
                request.respond(response).expect("response should succeed");
            }
        });
        Ok((addr, handle))
    }

    fn runtime(addr: &str) -> Result<ApiRuntime> {
        Ok(ApiRuntime::new(Client::new(addr, Duration::from_secs(1))?))
    }

    const ITEMS: &str = r#"{"items":[
        {"id":1,"name":"Lash Glue","barcode":"111","sku":"LG","unit_price":"$4.00","category":"Lashes","company":"N/A","supplier":"N/A","status":"Active"},
        {"id":2,"name":"Top Coat","barcode":"222","sku":"TC","unit_price":"$3.00","category":"Nails","company":"N/A","supplier":"N/A","status":"Not Confirmed"}
    ]}"#;

    #[test]
    fn categories_print_indented_tree() -> Result<()> {
        let (addr, handle) = serve(vec![(
            "/api/category_list",
            r#"{"categories":[
                {"id":2,"name":"Gel","status":"Active","parent_id":1,"children":[]},
                {"id":1,"name":"Nails","status":"Active","parent_id":null,"children":[]}
            ]}"#
            .to_owned(),
        )])?;

        let mut out = Vec::new();
        runtime(&addr)?.categories(None, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "Nails\n  Gel\n");

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn categories_search_reports_no_match() -> Result<()> {
        let (addr, handle) = serve(vec![(
            "/api/category_list",
            r#"{"categories":[{"id":1,"name":"Nails","status":"Active","parent_id":null,"children":[]}]}"#
                .to_owned(),
        )])?;

        let mut out = Vec::new();
        runtime(&addr)?.categories(Some("wigs"), &mut out)?;
        assert_eq!(String::from_utf8(out)?, "no categories match \"wigs\"\n");

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn not_confirmed_items_only_lists_that_tab() -> Result<()> {
        let (addr, handle) = serve(vec![("/api/item_list", ITEMS.to_owned())])?;

        let mut out = Vec::new();
        runtime(&addr)?.items(true, &mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("Top Coat"));
        assert!(!text.contains("Lash Glue"));
        assert!(text.ends_with("1 item(s) are not confirmed\n"));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn export_writes_selected_columns() -> Result<()> {
        let (addr, handle) = serve(vec![("/api/item_list", ITEMS.to_owned())])?;
        let (_dir, path) = temp_file("items.csv", "")?;

        let mut out = Vec::new();
        runtime(&addr)?.export(&path, &mut out)?;
        let written = std::fs::read_to_string(&path)?;
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("Barcode,SKU,Description,Selling Price"));
        assert_eq!(lines.next(), Some("111,LG,,$4.00"));
        assert!(String::from_utf8(out)?.starts_with("exported 2 item(s)"));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn import_reports_failed_rows_and_errors() -> Result<()> {
        let (addr, handle) = serve(vec![
            (
                "/api/add_item",
                r#"{"jsonrpc":"2.0","id":null,"result":{"success":true,"item_id":10}}"#.to_owned(),
            ),
            (
                "/api/add_item",
                r#"{"jsonrpc":"2.0","id":null,"result":{"success":false,"error":"duplicate barcode"}}"#
                    .to_owned(),
            ),
        ])?;
        let (_dir, path) = temp_file(
            "items.csv",
            "item_name,sku,description,barcode,selling_price\nA,S1,D,111,1\nB,S2,D,222,2\n",
        )?;

        let mut out = Vec::new();
        let error = runtime(&addr)?
            .import(&path, &mut out)
            .expect_err("a failed row should fail the command");
        assert!(error.to_string().contains("1 row(s) failed"));
        let text = String::from_utf8(out)?;
        assert!(text.contains("imported 1 of 2 item(s)"));
        assert!(text.contains("row 2 (barcode 222)"));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn import_rejects_bad_headers_before_contacting_server() -> Result<()> {
        let (_dir, path) = temp_file("items.csv", "name,price\nA,1\n")?;
        let mut runtime = runtime("http://127.0.0.1:1")?;
        let error = runtime
            .import(&path, &mut Vec::new())
            .expect_err("missing headers should fail");
        assert!(format!("{error:#}").contains("kiss --template"));
        Ok(())
    }
}
