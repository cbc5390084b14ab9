//! Self-contained HTML document for a laid-out graph
//!
//! The document carries an inline SVG drawing plus a JSON block with the
//! node list, edge list and physics constants, so it needs no external
//! assets to display or to re-layout client side.

use crate::error::DiagramError;
use crate::layout::{PhysicsParams, Position};
use lens_graph::Graph;
use serde::Serialize;
use std::fmt::Write as _;

const NODE_RADIUS: f64 = 15.0;
const MARGIN: f64 = 60.0;

#[derive(Serialize)]
struct NodeRecord<'a> {
    id: &'a str,
    label: &'a str,
    title: &'a str,
    level: usize,
    color: &'static str,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct EdgeRecord<'a> {
    from: &'a str,
    to: &'a str,
}

#[derive(Serialize)]
struct Payload<'a> {
    title: &'a str,
    nodes: Vec<NodeRecord<'a>>,
    edges: Vec<EdgeRecord<'a>>,
    physics: &'a PhysicsParams,
}

/// Render the HTML document
///
/// `positions` must follow graph node order, as returned by
/// [`crate::layout::layout`].
///
/// # Errors
/// Returns `DiagramError::Serialize` if the embedded JSON cannot be produced.
pub fn render_html(
    title: &str,
    graph: &Graph,
    positions: &[Position],
    physics: &PhysicsParams,
) -> Result<String, DiagramError> {
    let nodes: Vec<NodeRecord<'_>> = graph
        .nodes()
        .zip(positions)
        .map(|(node, pos)| NodeRecord {
            id: node.id.as_str(),
            label: &node.name,
            title: &node.name,
            level: node.depth,
            color: node.kind.color(),
            x: pos.x,
            y: pos.y,
        })
        .collect();
    let edges: Vec<EdgeRecord<'_>> = graph
        .edges()
        .iter()
        .map(|e| EdgeRecord {
            from: e.parent.as_str(),
            to: e.child.as_str(),
        })
        .collect();

    let svg = render_svg(&nodes, &edges);
    let payload = Payload {
        title,
        nodes,
        edges,
        physics,
    };
    // `<` only occurs inside JSON strings; escaping it keeps labels from
    // closing the script block
    let data = serde_json::to_string(&payload)?.replace('<', "\\u003c");

    let mut html = String::with_capacity(svg.len() + data.len() + 512);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(title));
    html.push_str("<style>body{margin:0;background:#ffffff;color:#000000;font-family:sans-serif}");
    html.push_str("#diagram{width:100%;height:400px}</style>\n</head>\n<body>\n");
    html.push_str(&svg);
    let _ = writeln!(
        html,
        "<script type=\"application/json\" id=\"graph-data\">{data}</script>"
    );
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn render_svg(nodes: &[NodeRecord<'_>], edges: &[EdgeRecord<'_>]) -> String {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    for n in nodes {
        min_x = min_x.min(n.x);
        min_y = min_y.min(n.y);
        max_x = max_x.max(n.x);
        max_y = max_y.max(n.y);
    }
    let width = (max_x - min_x) + 2.0 * MARGIN;
    let height = (max_y - min_y) + 2.0 * MARGIN;
    let (ox, oy) = (min_x - MARGIN, min_y - MARGIN);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg id=\"diagram\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{ox:.1} {oy:.1} {width:.1} {height:.1}\">"
    );

    let find = |id: &str| nodes.iter().find(|n| n.id == id);
    for edge in edges {
        if let (Some(a), Some(b)) = (find(edge.from), find(edge.to)) {
            let _ = writeln!(
                svg,
                "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#999999\"/>",
                a.x, a.y, b.x, b.y
            );
        }
    }
    for node in nodes {
        let _ = writeln!(
            svg,
            "<g><title>{title}</title><circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"{NODE_RADIUS}\" fill=\"{color}\"/>\
<text x=\"{x:.1}\" y=\"{ty:.1}\" text-anchor=\"middle\" font-size=\"12\">{label}</text></g>",
            title = escape(node.title),
            x = node.x,
            y = node.y,
            ty = node.y + NODE_RADIUS + 14.0,
            color = node.color,
            label = escape(node.label),
        );
    }
    svg.push_str("</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout;
    use lens_graph::parse_tree;

    fn render(tree: &str) -> String {
        let graph = parse_tree(tree);
        let physics = PhysicsParams::default();
        let positions = layout(&graph, &physics);
        render_html("owner/repo", &graph, &positions, &physics).unwrap()
    }

    #[test]
    fn embeds_nodes_edges_and_physics() {
        let html = render("└── repo/\n    └── src/");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("\"id\":\"0_repo\""));
        assert!(html.contains("\"from\":\"0_repo\",\"to\":\"1_src\""));
        assert!(html.contains("\"spring_length\":150.0"));
        assert!(html.contains("<line "));
    }

    #[test]
    fn escapes_markup_in_labels() {
        let html = render("├── <script>alert(1)</script>");
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        // The only script element is the data block
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn escape_covers_quotes() {
        assert_eq!(escape("a&\"b'"), "a&amp;&quot;b&#39;");
    }
}
