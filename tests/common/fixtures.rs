//! Page fixtures

use std::path::{Path, PathBuf};

use chrono::DateTime;
use pagesnap::artifact::FixedClock;
use pagesnap::dom::{parse_html, CanvasBitmap, DocumentHandle, MemoryDocument};

pub const FIXTURE_URL: &str = "https://example.com/article";

/// A page with a canvas, a hidden block, a head `<noscript>`, a same-process
/// frame and an article that can be selected.
pub const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Example</title>
<noscript><style>.js-only { display: none }</style></noscript>
<script>document.write("</scr" + "ipt>");</script>
</head>
<body>
<nav>Site menu</nav>
<article id="story">
<h1>Headline</h1>
<p id="lead">Lead paragraph with the selected words.</p>
<div id="ad" style="display:none">Advert</div>
<canvas id="chart" width="4" height="2"></canvas>
</article>
<iframe id="embed" srcdoc="<p>Embedded</p>"></iframe>
</body>
</html>
"#;

/// [`ARTICLE_HTML`] parsed, with a painted canvas and the lead paragraph selected.
pub fn article_document() -> MemoryDocument {
    let mut doc = parse_html(ARTICLE_HTML, FIXTURE_URL).expect("fixture parses");
    let canvas = doc.element_by_id("chart").expect("fixture has a canvas");
    doc.set_canvas_bitmap(canvas, CanvasBitmap::filled(4, 2, [0, 0, 255, 255]));
    let lead = doc.element_by_id("lead").expect("fixture has a lead paragraph");
    doc.select_node_contents(lead);
    doc
}

pub fn fixed_clock() -> FixedClock {
    FixedClock(DateTime::parse_from_rfc3339("2024-03-05T14:07:09+00:00").expect("valid timestamp"))
}

/// Write `html` to `dir/name` and return the path.
pub fn write_page(dir: &Path, name: &str, html: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, html).expect("write fixture page");
    path
}
