//! Response facade consumed by actions. Pure data: the adapter realizes the
//! recorded redirect/forward/body against its actual transport.

/// Accumulates what actions want the adapter to do with the response.
#[derive(Clone, Debug)]
pub struct MutableResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
    redirect: Option<String>,
    forward: Option<String>,
}

impl MutableResponse {
    pub fn new() -> Self {
        MutableResponse {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
            redirect: None,
            forward: None,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Append to the response body.
    pub fn write(&mut self, content: &str) {
        self.body.push_str(content);
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Record a client-side redirect. Sets the status to 302.
    pub fn send_redirect(&mut self, location: &str) {
        self.status = 302;
        self.redirect = Some(location.to_string());
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Record an internal forward to another handler.
    pub fn forward_to(&mut self, target: &str) {
        self.forward = Some(target.to_string());
    }

    pub fn forward(&self) -> Option<&str> {
        self.forward.as_deref()
    }
}

impl Default for MutableResponse {
    fn default() -> Self {
        MutableResponse::new()
    }
}
