use bytes::Bytes;
use micro_request::protocol::body::FormBody;
use micro_request::protocol::{RequestEnvelope, RequestOptions};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let form = FormBody::new();
    form.append("a", "1").expect("form is open");
    form.append("b", "2").expect("form is open");
    form.append_binary("file", Bytes::from_static(b"Hello, world!"), Some("hello.txt".into())).expect("form is open");

    let mut request = match RequestEnvelope::new("http://localhost:3000", RequestOptions::new().body(form)) {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "build request error");
            return;
        }
    };

    match request.clone().read_as_text().await {
        Ok(text) => println!("{text}"),
        Err(e) => error!(cause = %e, "read cloned request error"),
    }

    match request.read_as_text().await {
        Ok(text) => println!("{text}"),
        Err(e) => error!(cause = %e, "read request error"),
    }

    if let Err(e) = request.read_as_text().await {
        info!(cause = %e, "second read of the original is rejected");
    }
}
