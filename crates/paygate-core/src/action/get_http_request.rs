use paygate_kernel::gateway::{Action, Gateway, GatewayError, GatewayResult, Request};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// Snapshot of the HTTP request the process is serving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetHttpRequest {
    pub method: String,
    pub uri: String,
    pub query: BTreeMap<String, String>,
    pub client_ip: String,
    pub user_agent: String,
    pub content: String,
}

impl GetHttpRequest {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Where the CGI-style request variables come from.
#[derive(Debug, Clone, Default)]
pub enum ServerVars {
    /// The process environment.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(HashMap<String, String>),
}

impl ServerVars {
    fn get(&self, name: &str) -> Option<String> {
        match self {
            ServerVars::Process => std::env::var(name).ok(),
            ServerVars::Fixed(vars) => vars.get(name).cloned(),
        }
        .filter(|value| !value.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ServerVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ServerVars::Fixed(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Fills [`GetHttpRequest`] from `REQUEST_METHOD`, `HTTPS`, `HTTP_HOST`,
/// `REQUEST_URI`, `QUERY_STRING`, `REMOTE_ADDR`, `HTTP_USER_AGENT` and
/// `CONTENT` (the raw request body).
#[derive(Debug, Clone, Default)]
pub struct GetHttpRequestAction {
    vars: ServerVars,
}

impl GetHttpRequestAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(vars: ServerVars) -> Self {
        Self { vars }
    }

    fn snapshot(&self) -> GatewayResult<GetHttpRequest> {
        let scheme = match self.vars.get("HTTPS").as_deref() {
            Some("off") | None => "http",
            Some(_) => "https",
        };
        let host = self
            .vars
            .get("HTTP_HOST")
            .or_else(|| self.vars.get("SERVER_NAME"))
            .unwrap_or_else(|| "localhost".to_string());
        let path = self.vars.get("REQUEST_URI").unwrap_or_else(|| "/".to_string());

        let mut url = reqwest::Url::parse(&format!("{scheme}://{host}{path}"))
            .map_err(|e| GatewayError::action_failed("GetHttpRequestAction", e))?;
        if let Some(query) = self.vars.get("QUERY_STRING") {
            url.set_query(Some(&query));
        }

        Ok(GetHttpRequest {
            method: self
                .vars
                .get("REQUEST_METHOD")
                .map(|m| m.to_ascii_uppercase())
                .unwrap_or_else(|| "GET".to_string()),
            query: url.query_pairs().into_owned().collect(),
            uri: url.to_string(),
            client_ip: self.vars.get("REMOTE_ADDR").unwrap_or_default(),
            user_agent: self.vars.get("HTTP_USER_AGENT").unwrap_or_default(),
            content: self.vars.get("CONTENT").unwrap_or_default(),
        })
    }
}

impl Action for GetHttpRequestAction {
    fn supports(&self, request: &dyn Request) -> bool {
        request.is::<GetHttpRequest>()
    }

    fn execute(&self, request: &mut dyn Request, _gateway: &Gateway) -> GatewayResult<()> {
        let snapshot = self.snapshot()?;
        let Some(target) = request.downcast_mut::<GetHttpRequest>() else {
            return Err(GatewayError::RequestNotSupported(
                (*request).request_name().to_string(),
            ));
        };
        trace!(method = %snapshot.method, uri = %snapshot.uri, "captured http request");
        *target = snapshot;
        Ok(())
    }
}
