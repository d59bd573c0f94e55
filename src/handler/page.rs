//! Index page embedding the video player

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::RequestContext;
use crate::config::PageConfig;
use crate::http::response::build_html_response;

/// Render the page; `video_src` is the proxy's chunk endpoint
pub fn render_index_page(page: &PageConfig, video_src: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
</head>
<body>
    <video src="{src}"
        width="{width}"
        height="{height}"
        controls
        autoplay
        crossorigin="anonymous"
        playsinline=""
        webkit-playsinline=""
    >
    </video>
</body>
</html>"#,
        title = escape_html(&page.title),
        src = escape_html(video_src),
        width = page.width,
        height = page.height,
    )
}

pub fn serve_index_page(
    ctx: &RequestContext<'_>,
    page: &PageConfig,
    video_src: &str,
) -> Response<Full<Bytes>> {
    build_html_response(render_index_page(page, video_src), ctx.is_head)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageConfig {
        PageConfig {
            title: "Demo <clip>".to_string(),
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn test_video_element() {
        let html = render_index_page(&page(), "/video");
        assert!(html.contains(r#"<video src="/video""#));
        assert!(html.contains(r#"width="640""#));
        assert!(html.contains(r#"height="480""#));
        assert!(html.contains("controls"));
        assert!(html.contains("autoplay"));
        assert!(html.contains("playsinline"));
    }

    #[test]
    fn test_title_escaped() {
        let html = render_index_page(&page(), "/video");
        assert!(html.contains("<title>Demo &lt;clip&gt;</title>"));
    }
}
