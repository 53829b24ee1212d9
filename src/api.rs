use crate::error::{Error, Result};
use crate::models::{Fields, Row, RowSet, Session};
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

// Ids are opaque but path-embedded; reject anything that would not survive
// URL interpolation before issuing a request.
fn check_id(id: &str) -> Result<()> {
    let id_re = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    if id_re.is_match(id) {
        Ok(())
    } else {
        Err(Error::Validation(format!("malformed identifier: {:?}", id)))
    }
}

fn authorize(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => req.header("Authorization", format!("Bearer {}", token)),
        None => req,
    }
}

// Single-field equality filter, sent as a JSON object in the query string.
fn filter_param(field: &str, value: &str) -> String {
    let mut filter = Fields::new();
    filter.insert(field.to_string(), Value::String(value.to_string()));
    Value::Object(filter).to_string()
}

async fn response_error(res: Response) -> Error {
    let status = res.status();
    let message = res.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Error::Authentication(message)
    } else {
        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}

pub async fn list_rows(
    base_url: &str,
    token: Option<&str>,
    table_id: &str,
    filter: Option<(&str, &str)>,
) -> Result<Vec<Row>> {
    check_id(table_id)?;
    let client = Client::new();
    let url = format!("{}/table/{}/rows", base_url, table_id);
    debug!(url = %url, "listing rows");

    let mut req = client.get(&url);
    if let Some((field, value)) = filter {
        req = req.query(&[("filter", filter_param(field, value))]);
    }

    let res = authorize(req, token).send().await?;
    if res.status().is_success() {
        let set = res.json::<RowSet>().await?;
        Ok(set.rows)
    } else {
        Err(response_error(res).await)
    }
}

pub async fn create_row<T: DeserializeOwned>(
    base_url: &str,
    token: Option<&str>,
    table_id: &str,
    fields: &Fields,
) -> Result<T> {
    check_id(table_id)?;
    let client = Client::new();
    let url = format!("{}/table/{}/rows", base_url, table_id);
    debug!(url = %url, "creating row");

    let res = authorize(client.post(&url), token)
        .json(&json!({ "fields": fields }))
        .send()
        .await?;
    if res.status().is_success() {
        Ok(res.json::<T>().await?)
    } else {
        Err(response_error(res).await)
    }
}

pub async fn update_row(
    base_url: &str,
    token: Option<&str>,
    table_id: &str,
    row_id: &str,
    fields: &Fields,
) -> Result<Value> {
    check_id(table_id)?;
    check_id(row_id)?;
    let client = Client::new();
    let url = format!("{}/table/{}/rows/{}", base_url, table_id, row_id);
    debug!(url = %url, "updating row");

    let res = authorize(client.patch(&url), token)
        .json(&json!({ "fields": fields }))
        .send()
        .await?;
    if res.status().is_success() {
        Ok(res.json::<Value>().await?)
    } else {
        Err(response_error(res).await)
    }
}

pub async fn delete_row(
    base_url: &str,
    token: Option<&str>,
    table_id: &str,
    row_id: &str,
) -> Result<()> {
    check_id(table_id)?;
    check_id(row_id)?;
    let client = Client::new();
    let url = format!("{}/table/{}/rows/{}", base_url, table_id, row_id);
    debug!(url = %url, "deleting row");

    let res = authorize(client.delete(&url), token).send().await?;
    if res.status().is_success() {
        Ok(())
    } else {
        Err(response_error(res).await)
    }
}

pub async fn login(base_url: &str, email: &str, password: &str) -> Result<Session> {
    let client = Client::new();
    let url = format!("{}/auth/login", base_url);

    let res = client
        .post(&url)
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    if res.status().is_success() {
        Ok(res.json::<Session>().await?)
    } else {
        Err(response_error(res).await)
    }
}

pub async fn register(base_url: &str, name: &str, email: &str, password: &str) -> Result<Session> {
    let client = Client::new();
    let url = format!("{}/auth/register", base_url);

    let res = client
        .post(&url)
        .json(&json!({ "name": name, "email": email, "password": password }))
        .send()
        .await?;
    if res.status().is_success() {
        Ok(res.json::<Session>().await?)
    } else {
        Err(response_error(res).await)
    }
}

pub async fn logout(base_url: &str, token: Option<&str>) -> Result<()> {
    let client = Client::new();
    let url = format!("{}/auth/logout", base_url);

    let res = authorize(client.post(&url), token).send().await?;
    if res.status().is_success() {
        Ok(())
    } else {
        Err(response_error(res).await)
    }
}
