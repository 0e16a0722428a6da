//! Request envelope handling implementation.
//!
//! A [`RequestEnvelope`] carries a target, a method, headers and at most one
//! form body. Reading the body consumes the envelope's cursor; cloning the
//! envelope is how a body gets read more than once.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, IntoHeaderName};
use http::{HeaderMap, HeaderValue, Method, Request, Uri};
use mime::Mime;
use tracing::debug;

use crate::ensure;
use crate::protocol::body::{BodyCursor, CursorState, FormBody, FormStream};
use crate::protocol::{BodyError, RequestError};

/// Options recognized when constructing a [`RequestEnvelope`].
///
/// Defaults to a `GET` with no headers and no body.
#[derive(Debug, Default)]
pub struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<FormBody>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a header, keeping earlier values with the same name.
    #[must_use]
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: FormBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// An in-memory request carrying an optional multipart form body.
///
/// Each envelope owns one [`BodyCursor`], so its body can be read once. To
/// read the same body again, clone the envelope before or after reading: the
/// clone shares the form entries but gets a brand-new, unread cursor.
///
/// # Example
///
/// ```
/// use micro_request::protocol::body::FormBody;
/// use micro_request::protocol::{RequestEnvelope, RequestOptions};
///
/// # tokio_test(async {
/// let form = FormBody::new();
/// form.append("a", "1").unwrap();
///
/// let mut request = RequestEnvelope::new("http://localhost:3000", RequestOptions::new().body(form)).unwrap();
///
/// let mut copy = request.clone();
/// assert!(copy.read_as_text().await.unwrap().contains("name=\"a\""));
/// assert!(request.read_as_text().await.unwrap().contains("name=\"a\""));
/// assert!(request.read_as_text().await.is_err());
/// # });
/// # fn tokio_test<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
/// # }
/// ```
#[derive(Debug)]
pub struct RequestEnvelope {
    target: Uri,
    method: Method,
    headers: HeaderMap,
    cursor: Option<BodyCursor>,
}

impl RequestEnvelope {
    /// Creates an envelope for `target`, taking method, headers and body from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidTarget`] if `target` is empty or is not a valid URI.
    pub fn new(target: &str, options: RequestOptions) -> Result<Self, RequestError> {
        ensure!(!target.is_empty(), RequestError::invalid_target("target is empty"));

        let uri = target.parse::<Uri>().map_err(|e| RequestError::invalid_target(format!("{target}: {e}")))?;
        let RequestOptions { method, headers, body } = options;

        Ok(Self { target: uri, method, headers, cursor: body.map(BodyCursor::new) })
    }

    #[inline]
    pub fn target(&self) -> &Uri {
        &self.target
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the form body, if any
    pub fn body(&self) -> Option<&FormBody> {
        self.cursor.as_ref().map(BodyCursor::body)
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        self.cursor.is_some()
    }

    /// Returns the state of this envelope's cursor, `None` without a body
    pub fn body_state(&self) -> Option<CursorState> {
        self.cursor.as_ref().map(BodyCursor::state)
    }

    /// Returns true once a read has started on this envelope's body
    pub fn body_used(&self) -> bool {
        self.cursor.as_ref().is_some_and(BodyCursor::is_used)
    }

    /// Returns `multipart/form-data` when a body is present.
    ///
    /// The boundary parameter is not part of it: every read draws its own
    /// boundary, see [`into_request`](Self::into_request) for a request that carries one.
    pub fn content_type(&self) -> Option<Mime> {
        self.cursor.as_ref().map(|_| mime::MULTIPART_FORM_DATA)
    }

    /// Reads the whole body as multipart bytes.
    ///
    /// An envelope without a body yields empty bytes, every time.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::AlreadyConsumed`] if this envelope's body was read before.
    pub async fn read_as_bytes(&mut self) -> Result<Bytes, BodyError> {
        match &mut self.cursor {
            Some(cursor) => cursor.read_to_bytes().await,
            None => Ok(Bytes::new()),
        }
    }

    /// Reads the whole body and decodes it as UTF-8 text.
    ///
    /// Invalid sequences, which can only come from binary entries, are replaced
    /// with `U+FFFD`. An envelope without a body yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::AlreadyConsumed`] if this envelope's body was read before.
    pub async fn read_as_text(&mut self) -> Result<String, BodyError> {
        let bytes = self.read_as_bytes().await?;
        match String::from_utf8(bytes.into()) {
            Ok(text) => Ok(text),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }

    /// Converts into an `http::Request` whose body streams the form.
    ///
    /// This starts a read on the envelope's cursor; the `Content-Type` header is set
    /// with the boundary the returned stream uses. Without a body the request
    /// carries an empty stream and no content type.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::AlreadyConsumed`] if this envelope's body was read before.
    pub fn into_request(self) -> Result<Request<FormStream>, BodyError> {
        let RequestEnvelope { target, method, mut headers, cursor } = self;

        let body = match cursor {
            Some(mut cursor) => {
                let stream = cursor.begin()?;
                if let Some(mime) = stream.content_type() {
                    let value = HeaderValue::from_str(mime.as_ref()).map_err(BodyError::encoding)?;
                    headers.insert(CONTENT_TYPE, value);
                }
                stream
            }
            None => FormStream::empty(),
        };

        let mut request = Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = target;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

/// Clones the envelope with a fresh, unread cursor over the same form body.
///
/// This never fails and does not depend on whether the original has been read.
impl Clone for RequestEnvelope {
    fn clone(&self) -> Self {
        debug!(uri = %self.target, state = ?self.body_state(), "clone request envelope");
        Self {
            target: self.target.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            cursor: self.cursor.as_ref().map(BodyCursor::fork),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use http_body_util::BodyExt;

    fn hello_form() -> FormBody {
        let form = FormBody::new();
        form.append("a", "1").unwrap();
        form.append("b", "2").unwrap();
        form.append_binary("file", Bytes::from_static(b"Hello, world!"), Some("hello.txt".into())).unwrap();
        form
    }

    fn hello_request() -> RequestEnvelope {
        RequestEnvelope::new("http://localhost:3000", RequestOptions::new().body(hello_form())).unwrap()
    }

    fn assert_hello_text(text: &str) {
        for needle in ["name=\"a\"", "name=\"b\"", "name=\"file\"; filename=\"hello.txt\"", "Hello, world!"] {
            assert_eq!(text.matches(needle).count(), 1, "{needle} in {text}");
        }
        assert_eq!(text.matches("\r\n1\r\n").count(), 1);
        assert_eq!(text.matches("\r\n2\r\n").count(), 1);
    }

    /// Replaces the boundary token of a materialized body with a fixed marker.
    fn normalize(text: &str) -> String {
        let boundary = text.lines().next().unwrap().trim_start_matches("--");
        text.replace(boundary, "BOUNDARY")
    }

    fn check_send<T: Send>() {}

    #[test]
    fn is_send() {
        check_send::<RequestEnvelope>();
    }

    #[tokio::test]
    async fn clone_then_read_both() {
        let mut request = hello_request();

        let clone_text = request.clone().read_as_text().await.unwrap();
        let text = request.read_as_text().await.unwrap();

        assert_hello_text(&clone_text);
        assert_hello_text(&text);
        assert_eq!(normalize(&clone_text), normalize(&text));
    }

    #[tokio::test]
    async fn second_read_fails() {
        let mut request = hello_request();

        assert!(request.read_as_text().await.is_ok());
        assert!(request.read_as_text().await.unwrap_err().is_already_consumed());
        assert!(request.read_as_bytes().await.unwrap_err().is_already_consumed());
        assert_eq!(request.body_state(), Some(CursorState::Consumed));
    }

    #[tokio::test]
    async fn clone_after_read_is_fresh() {
        let mut request = hello_request();
        request.read_as_text().await.unwrap();
        assert!(request.body_used());

        let mut clone = request.clone();
        assert!(!clone.body_used());
        assert_hello_text(&clone.read_as_text().await.unwrap());
    }

    #[tokio::test]
    async fn clones_read_concurrently() {
        let request = hello_request();
        let mut first = request.clone();
        let mut second = request.clone();

        let first = tokio::spawn(async move { first.read_as_text().await });
        let second = tokio::spawn(async move { second.read_as_text().await });

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(normalize(&first), normalize(&second));
    }

    #[tokio::test]
    async fn no_body_reads_empty() {
        let mut request = RequestEnvelope::new("http://localhost:3000", RequestOptions::new()).unwrap();

        assert!(!request.has_body());
        assert!(request.content_type().is_none());
        assert_eq!(request.read_as_text().await.unwrap(), "");
        assert_eq!(request.read_as_text().await.unwrap(), "");
        assert!(request.read_as_bytes().await.unwrap().is_empty());
        assert!(!request.body_used());
    }

    #[tokio::test]
    async fn append_after_read_fails() {
        let form = hello_form();
        let mut request =
            RequestEnvelope::new("http://localhost:3000", RequestOptions::new().body(form.clone())).unwrap();

        form.append("late", "before").unwrap();
        let text = request.read_as_text().await.unwrap();
        assert!(text.contains("name=\"late\""));

        assert!(form.append("later", "after").unwrap_err().is_invalid_state());
    }

    #[test]
    fn read_completes_without_suspending() {
        let mut request = hello_request();
        let text = request.read_as_text().now_or_never().unwrap().unwrap();
        assert_hello_text(&text);
    }

    #[tokio::test]
    async fn binary_is_decoded_lossy() {
        let form = FormBody::new();
        form.append("raw", vec![0xff_u8, b'o', b'k']).unwrap();
        let mut request = RequestEnvelope::new("/upload", RequestOptions::new().body(form)).unwrap();

        let text = request.read_as_text().await.unwrap();
        assert!(text.contains("\u{fffd}ok"));
    }

    #[test]
    fn invalid_target() {
        assert!(matches!(RequestEnvelope::new("", RequestOptions::new()), Err(RequestError::InvalidTarget { .. })));
        assert!(matches!(
            RequestEnvelope::new("http://local host", RequestOptions::new()),
            Err(RequestError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn options_are_kept_by_clone() {
        let request = RequestEnvelope::new(
            "http://localhost:3000/upload",
            RequestOptions::new()
                .method(Method::POST)
                .header(http::header::ACCEPT, HeaderValue::from_static("text/plain"))
                .body(hello_form()),
        )
        .unwrap();
        let clone = request.clone();

        assert_eq!(clone.target().path(), "/upload");
        assert_eq!(clone.method(), Method::POST);
        assert_eq!(clone.headers()[http::header::ACCEPT], "text/plain");
        assert_eq!(clone.content_type(), Some(mime::MULTIPART_FORM_DATA));
        assert_eq!(clone.body().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn into_request_sets_boundary() {
        let request = RequestEnvelope::new("http://localhost:3000", RequestOptions::new().method(Method::POST).body(hello_form()))
            .unwrap();
        let clone = request.clone();

        let request = request.into_request().unwrap();
        assert_eq!(request.method(), Method::POST);

        let boundary = request.body().boundary().unwrap().to_owned();
        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap().to_owned();
        assert_eq!(content_type, format!("multipart/form-data; boundary={boundary}"));

        let bytes = request.into_body().collect().await.unwrap().to_bytes();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));

        // the clone is unaffected by the conversion of the original
        assert!(!clone.body_used());
    }

    #[tokio::test]
    async fn into_request_after_read_fails() {
        let mut request = hello_request();
        request.read_as_text().await.unwrap();

        assert!(request.into_request().unwrap_err().is_already_consumed());
    }

    #[tokio::test]
    async fn into_request_without_body() {
        let request = RequestEnvelope::new("/", RequestOptions::new()).unwrap().into_request().unwrap();

        assert!(request.headers().get(CONTENT_TYPE).is_none());
        assert!(request.into_body().collect().await.unwrap().to_bytes().is_empty());
    }
}
