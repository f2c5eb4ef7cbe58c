//! Debug reader.
//!
//! Renders every page of a chapter as an `<img>` pointing at the gateway's own image relay, so
//! the whole resolve and relay path can be checked in a browser.

use crate::normalize::pages::{self, PageQuality};
use crate::server::AppState;

use actix_web::http::header::ContentType;
use actix_web::{get, web, HttpRequest, HttpResponse};
use url::form_urlencoded;

/// Escapes text for use in html content and double quoted attributes
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Url of the relay endpoint serving `page_url`
pub fn proxy_url(gateway_base: &str, page_url: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(page_url.as_bytes()).collect();

    format!("{gateway_base}/mangadex/image-proxy?url={encoded}")
}

pub fn render_reader(chapter_id: &str, gateway_base: &str, page_urls: &[String]) -> String {
    let chapter_id = html_escape(chapter_id);

    let mut html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Test Reader - Chapter {chapter_id}</title>
  <style>
    body {{ background-color: #1a1a1a; color: white; font-family: sans-serif; margin: 0; display: flex; flex-direction: column; align-items: center; }}
    h1 {{ padding: 20px; text-align: center; }}
    .page {{ max-width: 800px; width: 100%; margin-bottom: 10px; display: block; }}
  </style>
</head>
<body>
  <h1>Mode Tes Baca: Chapter {chapter_id}</h1>
  <div>
"#
    );

    for (i, page_url) in page_urls.iter().enumerate() {
        let src = html_escape(&proxy_url(gateway_base, page_url));

        html.push_str(&format!(
            "    <img class=\"page\" src=\"{src}\" loading=\"lazy\" alt=\"Page {}\" />\n",
            i + 1
        ));
    }

    html.push_str("  </div>\n</body>\n</html>\n");
    html
}

pub fn render_error(message: &str) -> String {
    format!(
        r#"<h1 style="color:red">Error: {}</h1>"#,
        html_escape(message)
    )
}

#[get("/test-read/{chapter_id}")]
#[tracing::instrument(skip(data, req))]
pub(crate) async fn test_read(
    data: web::Data<AppState>,
    req: HttpRequest,
    chapter_id: web::Path<String>,
) -> HttpResponse {
    let meta = match data.client.get_chapter_download_meta(&chapter_id).await {
        Ok(meta) => meta,
        Err(e) => {
            tracing::error!("test reader failed for chapter {chapter_id}: {e}");

            return HttpResponse::InternalServerError()
                .content_type(ContentType::html())
                .body(render_error(&e.to_string()));
        }
    };

    let page_urls = pages::resolve(&meta, PageQuality::Data);

    let gateway_base = {
        let info = req.connection_info();
        format!("{}://{}", info.scheme(), info.host())
    };

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render_reader(&chapter_id, &gateway_base, &page_urls))
}
