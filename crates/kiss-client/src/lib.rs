// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use kiss_app::filters::FilterPayload;
use kiss_app::forms::{CategoryFormInput, ItemFormInput, LabelTemplateFormInput, TaxFormInput};
use kiss_app::import::{ImportRow, ItemSink};
use kiss_app::{
    Category, CategoryId, Item, ItemId, ItemStatusUpdate, LabelTemplate, LabelTemplateId,
    ProductSummary, SavedFilter, SavedFilterId, Tax, TaxId, Warehouse, WarehouseId,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryProducts {
    pub category: CategoryRef,
    #[serde(default)]
    pub products: Vec<ProductSummary>,
}

/// Outcome of a mutation that answers with `{success, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Ack {
    fn into_result(self, what: &str) -> Result<Option<String>> {
        if self.success {
            return Ok(self.message);
        }
        let reason = self
            .error
            .or(self.message)
            .unwrap_or_else(|| "no reason given".to_owned());
        bail!("{what} failed: {reason}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxUse {
    Sale,
    Purchase,
    None,
}

impl TaxUse {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Purchase => "purchase",
            Self::None => "none",
        }
    }
}

/// Query for the tax list; unset fields are not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxQuery {
    pub tax_use: Option<TaxUse>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarcodeItem {
    pub id: ItemId,
    pub name: String,
    pub barcode: String,
    pub sku: String,
    pub price: Option<f64>,
}

/// Sheet layout for the barcode endpoint. Sizes are millimetres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarcodeSheet {
    #[serde(rename = "items_data")]
    pub items: Vec<BarcodeItem>,
    pub labels_per_row: u32,
    pub label_width: f64,
    pub label_height: f64,
    pub page_size: String,
    pub barcode_type: String,
}

impl BarcodeSheet {
    pub fn new(items: Vec<BarcodeItem>) -> Self {
        Self {
            items,
            labels_per_row: 3,
            label_width: 60.0,
            label_height: 40.0,
            page_size: "A4".to_owned(),
            barcode_type: "Code128".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("server.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "server.base_url {base_url:?} must start with http:// or https:// -- for example http://{base_url}"
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Reach the server with the cheapest listing call.
    pub fn ping(&self) -> Result<usize> {
        let categories = self.list_categories()?;
        Ok(categories.len())
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let parsed: CategoriesResponse =
            self.fetch(self.http.get(self.endpoint("/api/category_list", &[])?), "category list")?;
        Ok(parsed.categories)
    }

    pub fn products_by_category(&self, category_id: CategoryId) -> Result<CategoryProducts> {
        let url = self.endpoint(
            "/api/products_by_category",
            &[("category_id", category_id.to_string())],
        )?;
        self.fetch(self.http.get(url), "category products")
    }

    pub fn add_category(&self, input: &CategoryFormInput) -> Result<CategoryId> {
        input.validate()?;
        let result: CreatedCategory = self.rpc("/api/category_add", input, "add category")?;
        if !result.success {
            bail!(
                "add category failed: {}",
                result.error.unwrap_or_else(|| "no reason given".to_owned())
            );
        }
        let id = result
            .category_id
            .ok_or_else(|| anyhow!("add category succeeded without a category id"))?;
        info!(category_id = %id, name = %input.name, "category saved");
        Ok(id)
    }

    pub fn remove_items_from_category(
        &self,
        category_id: CategoryId,
        product_ids: &[ItemId],
    ) -> Result<Option<String>> {
        let params = RemoveItemsRequest {
            category_id,
            product_ids,
        };
        let ack: Ack = self.rpc("/api/category/remove_items", &params, "remove items")?;
        ack.into_result("remove items from category")
    }

    pub fn delete_category(&self, category_id: CategoryId) -> Result<Option<String>> {
        let ack: Ack = self.rpc(
            "/api/category/delete",
            &CategoryIdRequest { category_id },
            "delete category",
        )?;
        ack.into_result("delete category")
    }

    pub fn list_items(&self, search: Option<&str>) -> Result<Vec<Item>> {
        let query: Vec<(&str, String)> = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| vec![("search", term.to_owned())])
            .unwrap_or_default();
        let parsed: ItemsResponse =
            self.fetch(self.http.get(self.endpoint("/api/item_list", &query)?), "item list")?;
        Ok(parsed.items)
    }

    pub fn filter_items(&self, payload: &FilterPayload) -> Result<Vec<Item>> {
        debug!(dimensions = payload.active_dimensions().len(), "filtering items");
        let request = self
            .http
            .post(self.endpoint("/api/item_list", &[])?)
            .json(payload);
        let parsed: ItemsResponse = self.fetch(request, "filtered item list")?;
        Ok(parsed.items)
    }

    pub fn update_item_status(&self, updates: &[ItemStatusUpdate]) -> Result<()> {
        if updates.is_empty() {
            bail!("no items selected -- select at least one item and retry");
        }
        let request = self
            .http
            .post(self.endpoint("/api/update_item_status", &[])?)
            .json(&StatusUpdateRequest { items: updates });
        let ack: Ack = self.fetch(request, "item status update")?;
        ack.into_result("update item status")?;
        Ok(())
    }

    pub fn add_item(&self, input: &ItemFormInput) -> Result<ItemId> {
        input.validate()?;
        let params = AddItemRequest::from(input);
        let result: CreatedItem = self.rpc("/api/add_item", &params, "add item")?;
        if !result.success {
            bail!(
                "add item {:?} failed: {}",
                input.item_name,
                result.error.unwrap_or_else(|| "no reason given".to_owned())
            );
        }
        result
            .item_id
            .ok_or_else(|| anyhow!("add item succeeded without an item id"))
    }

    pub fn print_barcodes(&self, sheet: &BarcodeSheet) -> Result<Vec<u8>> {
        if sheet.items.is_empty() {
            bail!("no items to print -- select at least one item and retry");
        }
        let request = self
            .http
            .post(self.endpoint("/print_barcodes", &[])?)
            .json(sheet);
        self.document(request, "barcode sheet")
    }

    pub fn print_labels(&self, template_id: LabelTemplateId, items: &[Item]) -> Result<Vec<u8>> {
        if items.is_empty() {
            bail!("no items to print -- select at least one item and retry");
        }
        let request = self
            .http
            .post(self.endpoint("/api/print_labels", &[])?)
            .json(&PrintLabelsRequest { template_id, items });
        self.document(request, "label sheet")
    }

    pub fn list_label_templates(&self) -> Result<Vec<LabelTemplate>> {
        let request = self
            .http
            .post(self.endpoint("/api/label_templates", &[])?)
            .json(&serde_json::json!({}));
        let parsed: DataResponse<Vec<LabelTemplate>> = self.fetch(request, "label templates")?;
        parsed.into_data("list label templates")
    }

    pub fn create_label_template(&self, input: &LabelTemplateFormInput) -> Result<LabelTemplate> {
        input.validate()?;
        let request = self
            .http
            .post(self.endpoint("/api/label_template/create", &[])?)
            .json(input);
        let parsed: DataResponse<LabelTemplate> = self.fetch(request, "label template")?;
        parsed.into_data("create label template")
    }

    pub fn list_taxes(&self, query: TaxQuery) -> Result<Vec<Tax>> {
        let mut pairs = Vec::new();
        if let Some(tax_use) = query.tax_use {
            pairs.push(("type", tax_use.as_str().to_owned()));
        }
        if let Some(active) = query.active {
            pairs.push(("active", active.to_string()));
        }
        let parsed: DataResponse<Vec<Tax>> =
            self.fetch(self.http.get(self.endpoint("/api/taxes", &pairs)?), "tax list")?;
        parsed.into_data("list taxes")
    }

    pub fn create_tax(&self, input: &TaxFormInput) -> Result<Tax> {
        input.validate()?;
        let request = self.http.post(self.endpoint("/api/taxes", &[])?).json(input);
        let parsed: DataResponse<Tax> = self.fetch(request, "tax")?;
        parsed.into_data("create tax")
    }

    pub fn update_tax(&self, id: TaxId, input: &TaxFormInput) -> Result<Tax> {
        input.validate()?;
        let request = self
            .http
            .put(self.endpoint(&format!("/api/taxes/{id}"), &[])?)
            .json(input);
        let parsed: DataResponse<Tax> = self.fetch(request, "tax")?;
        parsed.into_data("update tax")
    }

    pub fn delete_tax(&self, id: TaxId) -> Result<()> {
        let request = self
            .http
            .delete(self.endpoint(&format!("/api/taxes/{id}"), &[])?);
        let ack: Ack = self.fetch(request, "tax delete")?;
        ack.into_result("delete tax")?;
        Ok(())
    }

    pub fn list_warehouses(&self) -> Result<Vec<Warehouse>> {
        let parsed: WarehousesResponse = self.fetch(
            self.http.get(self.endpoint("/api/warehouse_list", &[])?),
            "warehouse list",
        )?;
        Ok(parsed.warehouses)
    }

    pub fn delete_warehouse(&self, id: WarehouseId) -> Result<()> {
        let request = self
            .http
            .delete(self.endpoint(&format!("/api/warehouse_delete/{id}"), &[])?);
        let ack: Ack = self.fetch(request, "warehouse delete")?;
        ack.into_result("delete warehouse")?;
        Ok(())
    }

    pub fn list_filters(&self) -> Result<Vec<SavedFilter>> {
        let parsed: FiltersResponse =
            self.fetch(self.http.get(self.endpoint("/api/filters", &[])?), "saved filters")?;
        Ok(parsed.filters)
    }

    pub fn create_filter(&self, name: &str, payload: &FilterPayload) -> Result<SavedFilterId> {
        if name.trim().is_empty() {
            bail!("filter name is required -- enter a name and retry");
        }
        if payload.is_empty() {
            bail!("no filters applied -- apply at least one filter before saving");
        }
        let request = self
            .http
            .post(self.endpoint("/api/filters/create", &[])?)
            .json(&CreateFilterRequest {
                name,
                filter_parameters: payload,
            });
        let created: CreatedFilter = self.fetch(request, "saved filter")?;
        created
            .filter_id
            .ok_or_else(|| anyhow!("save filter succeeded without a filter id"))
    }

    pub fn delete_filter(&self, id: SavedFilterId) -> Result<()> {
        let request = self
            .http
            .put(self.endpoint(&format!("/api/filters/{id}/delete"), &[])?);
        let ack: Ack = self.fetch(request, "saved filter delete")?;
        ack.into_result("delete saved filter")?;
        Ok(())
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .with_context(|| format!("build URL for {path}"))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }

    fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.send(request)?;
        response.json().with_context(|| format!("decode {what}"))
    }

    fn document(&self, request: RequestBuilder, what: &str) -> Result<Vec<u8>> {
        let response = self.send(request)?;
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        let bytes = response
            .bytes()
            .with_context(|| format!("read {what}"))?
            .to_vec();
        // The print endpoints answer 200 with a JSON body when they refuse.
        if is_json {
            let ack: Ack =
                serde_json::from_slice(&bytes).with_context(|| format!("decode {what}"))?;
            ack.into_result(&format!("print {what}"))?;
            bail!("print {what} returned no document");
        }
        Ok(bytes)
    }

    fn rpc<P: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        params: &P,
        what: &str,
    ) -> Result<T> {
        let envelope = RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params,
        };
        let request = self.http.post(self.endpoint(path, &[])?).json(&envelope);
        let reply: RpcResponse = self.fetch(request, what)?;
        if let Some(error) = reply.error {
            return Err(rpc_error(what, &error));
        }
        let result = reply
            .result
            .ok_or_else(|| anyhow!("{what}: server sent neither result nor error"))?;
        if let Some(message) = result.get("error").and_then(serde_json::Value::as_str)
            && result.get("success").is_none()
        {
            bail!("{what} failed: {message}");
        }
        serde_json::from_value(result).with_context(|| format!("decode {what} result"))
    }
}

/// Creates each imported row through the add-item route.
impl ItemSink for Client {
    fn create_item(&mut self, row: &ImportRow) -> Result<ItemId> {
        self.add_item(&ItemFormInput::from_import_row(row))
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check server.base_url in the config and that the server is running ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    if body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

fn rpc_error(what: &str, error: &serde_json::Value) -> anyhow::Error {
    let message = error
        .get("data")
        .and_then(|data| data.get("message"))
        .or_else(|| error.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .or_else(|| error.as_str().map(str::to_owned))
        .unwrap_or_else(|| error.to_string());
    anyhow!("{what} failed: {message}")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'a str,
    method: &'a str,
    params: &'a P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> DataResponse<T> {
    fn into_data(self, what: &str) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => bail!("{what}: response has no data"),
            (false, _) => bail!(
                "{what} failed: {}",
                self.error.unwrap_or_else(|| "no reason given".to_owned())
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct WarehousesResponse {
    warehouses: Vec<Warehouse>,
}

#[derive(Debug, Deserialize)]
struct FiltersResponse {
    filters: Vec<SavedFilter>,
}

#[derive(Debug, Deserialize)]
struct CreatedCategory {
    #[serde(default)]
    success: bool,
    category_id: Option<CategoryId>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedItem {
    #[serde(default)]
    success: bool,
    item_id: Option<ItemId>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedFilter {
    filter_id: Option<SavedFilterId>,
}

#[derive(Debug, Serialize)]
struct CategoryIdRequest {
    category_id: CategoryId,
}

#[derive(Debug, Serialize)]
struct RemoveItemsRequest<'a> {
    category_id: CategoryId,
    product_ids: &'a [ItemId],
}

#[derive(Debug, Serialize)]
struct StatusUpdateRequest<'a> {
    items: &'a [ItemStatusUpdate],
}

#[derive(Debug, Serialize)]
struct PrintLabelsRequest<'a> {
    template_id: LabelTemplateId,
    items: &'a [Item],
}

#[derive(Debug, Serialize)]
struct CreateFilterRequest<'a> {
    name: &'a str,
    filter_parameters: &'a FilterPayload,
}

// The add-item route reads prices as text.
#[derive(Debug, Serialize)]
struct AddItemRequest<'a> {
    item_name: &'a str,
    barcode: &'a str,
    sku: &'a str,
    selling_price: String,
    cost: String,
    msrp: String,
    status: &'a str,
    company: &'a str,
    parent_company: &'a str,
    brand: &'a str,
    description: &'a str,
}

impl<'a> From<&'a ItemFormInput> for AddItemRequest<'a> {
    fn from(input: &'a ItemFormInput) -> Self {
        let price = |value: Option<f64>| {
            value
                .map(|value| format!("{value:.2}"))
                .unwrap_or_default()
        };
        Self {
            item_name: &input.item_name,
            barcode: &input.barcode,
            sku: &input.sku,
            selling_price: price(input.selling_price),
            cost: price(input.cost),
            msrp: price(input.msrp),
            status: input.status.as_str(),
            company: &input.company,
            parent_company: &input.parent_company,
            brand: &input.brand,
            description: &input.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Ack, AddItemRequest, DataResponse, clean_error_response, rpc_error};
    use kiss_app::forms::FormPayload;
    use kiss_app::{FormKind, ItemStatus};
    use reqwest::StatusCode;

    #[test]
    fn clean_error_prefers_json_error_field() {
        let error = clean_error_response(
            StatusCode::NOT_FOUND,
            r#"{"error": "Filter not found"}"#,
        );
        assert_eq!(error.to_string(), "server error (404): Filter not found");
    }

    #[test]
    fn clean_error_hides_html_bodies() {
        let error = clean_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>Traceback</body></html>",
        );
        assert_eq!(error.to_string(), "server returned 500");
    }

    #[test]
    fn rpc_error_reads_nested_message() {
        let error = rpc_error(
            "add item",
            &serde_json::json!({"code": 200, "data": {"message": "Access Denied"}}),
        );
        assert_eq!(error.to_string(), "add item failed: Access Denied");
    }

    #[test]
    fn failed_ack_reports_message() {
        let ack = Ack {
            success: false,
            message: Some("Category not found".to_owned()),
            error: None,
        };
        let error = ack
            .into_result("delete category")
            .expect_err("failure expected");
        assert_eq!(error.to_string(), "delete category failed: Category not found");
    }

    #[test]
    fn data_response_requires_success_flag() -> anyhow::Result<()> {
        let parsed: DataResponse<Vec<i64>> =
            serde_json::from_str(r#"{"success": false, "error": "nope"}"#)?;
        assert!(parsed.into_data("list").is_err());
        Ok(())
    }

    #[test]
    fn add_item_request_sends_prices_as_text() -> anyhow::Result<()> {
        let FormPayload::Item(mut input) = FormPayload::blank_for(FormKind::Item) else {
            panic!("item form expected");
        };
        input.item_name = "Top Coat".to_owned();
        input.barcode = "77".to_owned();
        input.selling_price = Some(4.5);
        input.status = ItemStatus::Active;
        let request = AddItemRequest::from(&input);
        let value = serde_json::to_value(&request)?;
        assert_eq!(value["selling_price"], "4.50");
        assert_eq!(value["cost"], "");
        assert_eq!(value["status"], "Active");
        Ok(())
    }
}
