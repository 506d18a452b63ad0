use actix_web::{App, HttpServer, web};
use url::Url;

/// Serves `routes` on a free local port for the rest of the test, returning
/// the base url.
pub fn serve<F>(routes: F) -> Url
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let port = portpicker::pick_unused_port().expect("a free port");
    let server = HttpServer::new(move || App::new().configure(routes.clone()))
        .workers(1)
        .bind(("127.0.0.1", port))
        .expect("to bind the fake server")
        .run();
    tokio::spawn(server);

    Url::parse(&format!("http://127.0.0.1:{port}/")).expect("a valid url")
}
