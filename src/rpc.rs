//! XML-RPC endpoints of the Odoo external API

use std::{error::Error, io::Cursor, time::Duration};

use anyhow::{Context as _, Result, anyhow, bail};
use log::debug;
use reqwest::{
    blocking::Client,
    header::{CONTENT_TYPE, USER_AGENT},
};
use xmlrpc::{Request, Transport, Value};

/// Numeric identifier of a remote record
pub type RecordId = i32;

/// A remote service accepting XML-RPC method calls
#[cfg_attr(test, mockall::automock)]
pub trait RpcEndpoint {
    fn call(&self, method: &str, params: Vec<Value>) -> Result<Value>;
}

/// Build the HTTP client shared by all endpoints of a run
pub fn rpc_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build XML-RPC client")
}

/// Endpoint below `<url>/xmlrpc/2/`
#[derive(Debug, Clone)]
pub struct XmlRpcEndpoint {
    client: Client,
    url: String,
}

impl XmlRpcEndpoint {
    /// Service for version probing and authentication
    pub fn common(client: Client, base_url: &str) -> Self {
        Self::service(client, base_url, "common")
    }

    /// Service for generic model method calls
    pub fn object(client: Client, base_url: &str) -> Self {
        Self::service(client, base_url, "object")
    }

    fn service(client: Client, base_url: &str, name: &str) -> Self {
        Self {
            client,
            url: format!("{}/xmlrpc/2/{name}", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcEndpoint for XmlRpcEndpoint {
    fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        debug!("Calling {method} on {}", self.url);

        let request = params
            .into_iter()
            .fold(Request::new(method), |request, param| request.arg(param));

        let transport = HttpTransport {
            client: &self.client,
            url: &self.url,
        };
        request
            .call(transport)
            .map_err(|e| anyhow!("{method} on {} failed: {e}", self.url))
    }
}

/// Posts one request through the shared client
struct HttpTransport<'a> {
    client: &'a Client,
    url: &'a str,
}

impl Transport for HttpTransport<'_> {
    type Stream = Cursor<Vec<u8>>;

    fn transmit(self, request: &Request<'_>) -> Result<Self::Stream, Box<dyn Error + Send + Sync>> {
        let mut body = Vec::new();
        request.write_as_xml(&mut body)?;

        let response = self
            .client
            .post(self.url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header(USER_AGENT, concat!("odoo-catalog/", env!("CARGO_PKG_VERSION")))
            .body(body)
            .send()?
            .error_for_status()?;

        Ok(Cursor::new(response.bytes()?.to_vec()))
    }
}

/// Interpret `value` as the id of a single record
pub fn record_id(value: &Value) -> Result<RecordId> {
    let id = match value {
        Value::Int(id) => *id,
        Value::Int64(id) => RecordId::try_from(*id)
            .map_err(|_| anyhow!("record id {id} is out of range"))?,
        other => bail!("expected a record id, got {other:?}"),
    };

    if id <= 0 {
        bail!("expected a positive record id, got {id}");
    }

    Ok(id)
}

/// Interpret `value` as a list of record ids, as returned by `search`
pub fn record_ids(value: &Value) -> Result<Vec<RecordId>> {
    match value {
        Value::Array(values) => values.iter().map(record_id).collect(),
        other => bail!("expected a list of record ids, got {other:?}"),
    }
}

/// Whether the server answered with a "no result" value
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Int64(i) => *i == 0,
        Value::String(s) => s.is_empty(),
        Value::Array(values) => values.is_empty(),
        Value::Struct(fields) => fields.is_empty(),
        Value::Nil => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::test_server::{Reply, serve_once};

    fn client() -> Client {
        rpc_client(Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn service_urls() {
        assert_eq!(
            XmlRpcEndpoint::common(client(), "https://erp.example.com/").url(),
            "https://erp.example.com/xmlrpc/2/common"
        );
        assert_eq!(
            XmlRpcEndpoint::object(client(), "https://erp.example.com").url(),
            "https://erp.example.com/xmlrpc/2/object"
        );
    }

    #[test]
    fn posts_method_call_and_parses_response() {
        let (url, server) = serve_once(Reply::status(
            "200 OK",
            "<?xml version=\"1.0\"?><methodResponse><params><param>\
             <value><int>7</int></value></param></params></methodResponse>",
        ));

        let endpoint = XmlRpcEndpoint::common(client(), &url);
        let uid = endpoint
            .call("authenticate", vec![Value::String("demo".to_string())])
            .unwrap();
        assert_eq!(uid, Value::Int(7));

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /xmlrpc/2/common "));
        assert!(request.contains("<methodName>authenticate</methodName>"));
        assert!(request.contains("demo"));
    }

    #[test]
    fn unresponsive_server_times_out() {
        let (url, _server) = serve_once(Reply::Silent(Duration::from_secs(5)));

        let started = Instant::now();
        let endpoint = XmlRpcEndpoint::object(client(), &url);
        assert!(endpoint.call("execute_kw", vec![]).is_err());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn parses_record_ids() {
        assert_eq!(record_id(&Value::Int(7)).unwrap(), 7);
        assert_eq!(record_id(&Value::Int64(42)).unwrap(), 42);
        assert!(record_id(&Value::Int(0)).is_err());
        assert!(record_id(&Value::Bool(false)).is_err());
        assert!(record_id(&Value::Int64(i64::MAX)).is_err());

        let ids = Value::Array(vec![Value::Int(3), Value::Int(5)]);
        assert_eq!(record_ids(&ids).unwrap(), [3, 5]);
        assert!(record_ids(&Value::Array(vec![])).unwrap().is_empty());
        assert!(record_ids(&Value::Int(3)).is_err());
    }

    #[test]
    fn falsy_values() {
        assert!(is_falsy(&Value::Bool(false)));
        assert!(is_falsy(&Value::Int(0)));
        assert!(is_falsy(&Value::Nil));
        assert!(!is_falsy(&Value::Int(2)));
        assert!(!is_falsy(&Value::Bool(true)));
    }
}
