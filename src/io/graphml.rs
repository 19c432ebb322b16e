//! GraphML serialization.
//!
//! Two on-disk flavors share one schema: `.graphml` is plain UTF-8 XML and
//! `.graphmlz` is the same document behind gzip. Attribute keys are declared
//! once per distinct `(attr name, scope)` with synthetic ids `d0, d1, …` and
//! a type tag, so integer and float attributes survive a round-trip without
//! collapsing into strings.

use crate::graph::{GraphError, NamedDiGraph, PropertyMap, PropertyValue};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// Errors from the GraphML collaborator.
#[derive(Error, Debug)]
pub enum GraphMlError {
    /// The requested file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// The path carries neither a `.graphml` nor a `.graphmlz` extension.
    #[error("unsupported graph file extension: '{0}'")]
    UnsupportedFormat(String),

    /// The document is not the GraphML we expect.
    #[error("malformed graphml: {0}")]
    Malformed(String),

    /// A graph operation failed while rebuilding the loaded graph.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML reader/writer error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute.
    #[error("malformed attribute: {0}")]
    Attr(#[from] AttrError),
}

pub type GraphMlResult<T> = Result<T, GraphMlError>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileFormat {
    Plain,
    Gzipped,
}

fn detect_format(path: &Path) -> GraphMlResult<FileFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("graphml") => Ok(FileFormat::Plain),
        Some("graphmlz") => Ok(FileFormat::Gzipped),
        other => Err(GraphMlError::UnsupportedFormat(
            other.unwrap_or("").to_string(),
        )),
    }
}

/// Serialize a graph to `path`, gzip-compressed when the extension says so.
pub fn save_to_file(graph: &NamedDiGraph, path: impl AsRef<Path>) -> GraphMlResult<()> {
    let path = path.as_ref();
    match detect_format(path)? {
        FileFormat::Plain => {
            let mut out = write_document(graph, BufWriter::new(File::create(path)?))?;
            out.flush()?;
        }
        FileFormat::Gzipped => {
            let encoder = GzEncoder::new(
                BufWriter::new(File::create(path)?),
                flate2::Compression::default(),
            );
            let encoder = write_document(graph, encoder)?;
            let mut inner = encoder.finish()?;
            inner.flush()?;
        }
    }
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "saved graphml"
    );
    Ok(())
}

/// Load a graph from `path`, decompressing when the extension says so.
pub fn load_from_file(path: impl AsRef<Path>) -> GraphMlResult<NamedDiGraph> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    if !path.exists() {
        return Err(GraphMlError::FileNotFound(path.to_path_buf()));
    }
    let graph = match format {
        FileFormat::Plain => parse_document(BufReader::new(File::open(path)?))?,
        FileFormat::Gzipped => {
            parse_document(BufReader::new(GzDecoder::new(BufReader::new(File::open(
                path,
            )?))))?
        }
    };
    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded graphml"
    );
    Ok(graph)
}

/// Key table built during serialization: one `<key>` per distinct
/// `(scope, attr name)`, ids handed out in emission order.
#[derive(Default)]
struct KeyTable {
    declared: Vec<(String, String, &'static str)>,
    index: HashMap<(String, String), usize>,
}

impl KeyTable {
    fn intern(&mut self, scope: &str, name: &str, value: &PropertyValue) -> String {
        let slot = (scope.to_string(), name.to_string());
        let idx = match self.index.get(&slot) {
            Some(&idx) => idx,
            None => {
                let idx = self.declared.len();
                self.declared
                    .push((scope.to_string(), name.to_string(), value.type_name()));
                self.index.insert(slot, idx);
                idx
            }
        };
        format!("d{}", idx)
    }
}

fn sorted_attrs(attrs: &PropertyMap) -> Vec<(&String, &PropertyValue)> {
    let mut pairs: Vec<_> = attrs.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
}

fn write_document<W: Write>(graph: &NamedDiGraph, out: W) -> GraphMlResult<W> {
    let node_names = graph.node_list();
    let edge_pairs = graph.edge_list();

    // Collect attribute payloads up front; key declarations must precede
    // the <graph> element.
    let mut keys = KeyTable::default();
    let mut node_data: Vec<(String, Vec<(String, String)>)> = Vec::with_capacity(node_names.len());
    for name in &node_names {
        let view = graph.get_node(name)?;
        let mut data = Vec::new();
        for (attr, value) in sorted_attrs(&view.attrs) {
            data.push((keys.intern("node", attr, value), value.to_string()));
        }
        node_data.push((name.clone(), data));
    }
    let mut edge_data: Vec<(String, String, Vec<(String, String)>)> =
        Vec::with_capacity(edge_pairs.len());
    for (source, target) in &edge_pairs {
        let view = graph.get_edge(source, target)?;
        let mut data = Vec::new();
        for (attr, value) in sorted_attrs(&view.attrs) {
            data.push((keys.intern("edge", attr, value), value.to_string()));
        }
        edge_data.push((source.clone(), target.clone(), data));
    }

    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("graphml");
    root.push_attribute(("xmlns", GRAPHML_NS));
    writer.write_event(Event::Start(root))?;

    for (idx, (scope, name, ty)) in keys.declared.iter().enumerate() {
        let mut key = BytesStart::new("key");
        key.push_attribute(("id", format!("d{}", idx).as_str()));
        key.push_attribute(("for", scope.as_str()));
        key.push_attribute(("attr.name", name.as_str()));
        key.push_attribute(("attr.type", *ty));
        writer.write_event(Event::Empty(key))?;
    }

    let mut graph_el = BytesStart::new("graph");
    graph_el.push_attribute(("edgedefault", "directed"));
    writer.write_event(Event::Start(graph_el))?;

    for (name, data) in &node_data {
        let mut node_el = BytesStart::new("node");
        node_el.push_attribute(("id", name.as_str()));
        if data.is_empty() {
            writer.write_event(Event::Empty(node_el))?;
        } else {
            writer.write_event(Event::Start(node_el))?;
            write_data(&mut writer, data)?;
            writer.write_event(Event::End(BytesEnd::new("node")))?;
        }
    }

    for (source, target, data) in &edge_data {
        let mut edge_el = BytesStart::new("edge");
        edge_el.push_attribute(("source", source.as_str()));
        edge_el.push_attribute(("target", target.as_str()));
        if data.is_empty() {
            writer.write_event(Event::Empty(edge_el))?;
        } else {
            writer.write_event(Event::Start(edge_el))?;
            write_data(&mut writer, data)?;
            writer.write_event(Event::End(BytesEnd::new("edge")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("graph")))?;
    writer.write_event(Event::End(BytesEnd::new("graphml")))?;
    Ok(writer.into_inner())
}

fn write_data<W: Write>(
    writer: &mut Writer<W>,
    data: &[(String, String)],
) -> GraphMlResult<()> {
    for (key_id, text) in data {
        let mut data_el = BytesStart::new("data");
        data_el.push_attribute(("key", key_id.as_str()));
        writer.write_event(Event::Start(data_el))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new("data")))?;
    }
    Ok(())
}

/// Declared value type of a `<key>`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum AttrType {
    Str,
    Int,
    Float,
}

impl AttrType {
    /// `int` and `float` (plus `double`, for files written by other tools)
    /// keep their numeric type; every other declared name reads as string.
    fn from_declared(name: &str) -> Self {
        match name {
            "int" => AttrType::Int,
            "float" | "double" => AttrType::Float,
            _ => AttrType::Str,
        }
    }

    fn parse(&self, text: &str) -> GraphMlResult<PropertyValue> {
        match self {
            AttrType::Str => Ok(PropertyValue::Str(text.to_string())),
            AttrType::Int => text
                .trim()
                .parse::<i64>()
                .map(PropertyValue::Integer)
                .map_err(|_| GraphMlError::Malformed(format!("bad int value '{}'", text))),
            AttrType::Float => text
                .trim()
                .parse::<f64>()
                .map(PropertyValue::Float)
                .map_err(|_| GraphMlError::Malformed(format!("bad float value '{}'", text))),
        }
    }
}

/// An element currently being assembled by the parser.
enum Pending {
    Node {
        id: String,
        attrs: PropertyMap,
    },
    Edge {
        source: String,
        target: String,
        attrs: PropertyMap,
    },
}

fn attr_value(e: &BytesStart<'_>, wanted: &[u8]) -> GraphMlResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == wanted {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required_attr(e: &BytesStart<'_>, wanted: &[u8], element: &str) -> GraphMlResult<String> {
    attr_value(e, wanted)?.ok_or_else(|| {
        GraphMlError::Malformed(format!(
            "<{}> is missing its '{}' attribute",
            element,
            String::from_utf8_lossy(wanted)
        ))
    })
}

fn parse_document<R: BufRead>(input: R) -> GraphMlResult<NamedDiGraph> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut saw_root = false;
    let mut keys: HashMap<String, (String, AttrType)> = HashMap::new();
    let mut pending: Option<Pending> = None;
    let mut data_key: Option<String> = None;
    let mut data_text = String::new();
    let mut nodes: Vec<(String, PropertyMap)> = Vec::new();
    let mut edges: Vec<(String, String, PropertyMap)> = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();
                if !saw_root {
                    if name.as_ref() != b"graphml" {
                        return Err(GraphMlError::Malformed(format!(
                            "root element is <{}>, expected <graphml>",
                            String::from_utf8_lossy(name.as_ref())
                        )));
                    }
                    let ns = declared_namespace(e)?;
                    if ns.as_deref() != Some(GRAPHML_NS) {
                        return Err(GraphMlError::Malformed(format!(
                            "root element is not in the {} namespace",
                            GRAPHML_NS
                        )));
                    }
                    saw_root = true;
                    continue;
                }
                match name.as_ref() {
                    b"key" => {
                        let id = required_attr(e, b"id", "key")?;
                        let attr_name = required_attr(e, b"attr.name", "key")?;
                        let declared = attr_value(e, b"attr.type")?
                            .unwrap_or_else(|| "string".to_string());
                        keys.insert(id, (attr_name, AttrType::from_declared(&declared)));
                    }
                    b"graph" => {
                        if let Some(default) = attr_value(e, b"edgedefault")? {
                            if default != "directed" {
                                return Err(GraphMlError::Malformed(format!(
                                    "edgedefault '{}' is not supported",
                                    default
                                )));
                            }
                        }
                    }
                    b"node" => {
                        let id = required_attr(e, b"id", "node")?;
                        if is_empty {
                            nodes.push((id, PropertyMap::new()));
                        } else {
                            pending = Some(Pending::Node {
                                id,
                                attrs: PropertyMap::new(),
                            });
                        }
                    }
                    b"edge" => {
                        let source = required_attr(e, b"source", "edge")?;
                        let target = required_attr(e, b"target", "edge")?;
                        if is_empty {
                            edges.push((source, target, PropertyMap::new()));
                        } else {
                            pending = Some(Pending::Edge {
                                source,
                                target,
                                attrs: PropertyMap::new(),
                            });
                        }
                    }
                    b"data" => {
                        if pending.is_none() {
                            return Err(GraphMlError::Malformed(
                                "<data> outside of a node or edge".to_string(),
                            ));
                        }
                        let key = required_attr(e, b"key", "data")?;
                        if is_empty {
                            store_data(&keys, &mut pending, &key, "")?;
                        } else {
                            data_key = Some(key);
                            data_text.clear();
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if data_key.is_some() {
                    data_text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if data_key.is_some() {
                    data_text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"data" => {
                    if let Some(key) = data_key.take() {
                        let text = std::mem::take(&mut data_text);
                        store_data(&keys, &mut pending, &key, &text)?;
                    }
                }
                b"node" | b"edge" => match pending.take() {
                    Some(Pending::Node { id, attrs }) => nodes.push((id, attrs)),
                    Some(Pending::Edge {
                        source,
                        target,
                        attrs,
                    }) => edges.push((source, target, attrs)),
                    None => {}
                },
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(GraphMlError::Malformed("empty document".to_string()));
    }

    let mut graph = NamedDiGraph::with_capacity(nodes.len());
    for (name, attrs) in nodes {
        graph.add_node(&name, attrs)?;
    }
    // Edges may reference nodes the file never declared; the facade
    // auto-creates those endpoints.
    graph.add_edges_from(edges)?;
    Ok(graph)
}

fn declared_namespace(e: &BytesStart<'_>) -> GraphMlResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn store_data(
    keys: &HashMap<String, (String, AttrType)>,
    pending: &mut Option<Pending>,
    key_id: &str,
    text: &str,
) -> GraphMlResult<()> {
    let (attr_name, ty) = keys
        .get(key_id)
        .ok_or_else(|| GraphMlError::Malformed(format!("undeclared data key '{}'", key_id)))?;
    let value = ty.parse(text)?;
    match pending {
        Some(Pending::Node { attrs, .. }) | Some(Pending::Edge { attrs, .. }) => {
            attrs.insert(attr_name.clone(), value);
        }
        None => {
            return Err(GraphMlError::Malformed(
                "<data> outside of a node or edge".to_string(),
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_str(xml: &str) -> GraphMlResult<NamedDiGraph> {
        parse_document(Cursor::new(xml.as_bytes()))
    }

    #[test]
    fn test_parse_minimal_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="edge" attr.name="weight" attr.type="float"/>
  <graph edgedefault="directed">
    <node id="a"/>
    <node id="b"/>
    <edge source="a" target="b">
      <data key="d0">1.5</data>
    </edge>
  </graph>
</graphml>"#;
        let graph = parse_str(xml).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.get_edge("a", "b").unwrap();
        assert_eq!(edge.attr("weight").unwrap().as_float(), Some(1.5));
    }

    #[test]
    fn test_typed_round_trip_through_buffer() {
        let mut graph = NamedDiGraph::new();
        let mut attrs = PropertyMap::new();
        attrs.insert("count".to_string(), PropertyValue::Integer(3));
        attrs.insert("label".to_string(), PropertyValue::Str("x&y".to_string()));
        graph.add_node("x", attrs).unwrap();
        let mut eattrs = PropertyMap::new();
        eattrs.insert("weight".to_string(), PropertyValue::Float(2.5));
        graph.add_edge("x", "y", eattrs).unwrap();

        let bytes = write_document(&graph, Vec::new()).unwrap();
        let loaded = parse_document(Cursor::new(bytes)).unwrap();

        let node = loaded.get_node("x").unwrap();
        assert_eq!(node.attr("count").unwrap(), &PropertyValue::Integer(3));
        assert_eq!(
            node.attr("label").unwrap(),
            &PropertyValue::Str("x&y".to_string())
        );
        let edge = loaded.get_edge("x", "y").unwrap();
        assert_eq!(edge.attr("weight").unwrap(), &PropertyValue::Float(2.5));
    }

    #[test]
    fn test_key_ids_assigned_in_emission_order() {
        let mut graph = NamedDiGraph::new();
        let mut attrs = PropertyMap::new();
        attrs.insert("alpha".to_string(), PropertyValue::Integer(1));
        attrs.insert("beta".to_string(), PropertyValue::Str("s".to_string()));
        graph.add_node("n", attrs).unwrap();

        let bytes = write_document(&graph, Vec::new()).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        // Attrs are visited in sorted order, so alpha gets d0 and beta d1.
        assert!(xml.contains(r#"<key id="d0" for="node" attr.name="alpha" attr.type="int"/>"#));
        assert!(xml.contains(r#"<key id="d1" for="node" attr.name="beta" attr.type="str"/>"#));
    }

    #[test]
    fn test_rejects_wrong_root() {
        let xml = r#"<?xml version="1.0"?><gexf xmlns="http://gexf.net/1.2"></gexf>"#;
        assert!(matches!(
            parse_str(xml).unwrap_err(),
            GraphMlError::Malformed(_)
        ));
    }

    #[test]
    fn test_rejects_wrong_namespace() {
        let xml = r#"<graphml xmlns="http://example.com/not-graphml"></graphml>"#;
        assert!(matches!(
            parse_str(xml).unwrap_err(),
            GraphMlError::Malformed(_)
        ));
    }

    #[test]
    fn test_rejects_undirected_graph() {
        let xml = r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <graph edgedefault="undirected"><node id="a"/></graph>
</graphml>"#;
        assert!(matches!(
            parse_str(xml).unwrap_err(),
            GraphMlError::Malformed(_)
        ));
    }

    #[test]
    fn test_rejects_undeclared_key() {
        let xml = r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <graph edgedefault="directed">
    <node id="a"><data key="d9">7</data></node>
  </graph>
</graphml>"#;
        assert!(matches!(
            parse_str(xml).unwrap_err(),
            GraphMlError::Malformed(_)
        ));
    }

    #[test]
    fn test_rejects_bad_int_value() {
        let xml = r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="count" attr.type="int"/>
  <graph edgedefault="directed">
    <node id="a"><data key="d0">seven</data></node>
  </graph>
</graphml>"#;
        assert!(matches!(
            parse_str(xml).unwrap_err(),
            GraphMlError::Malformed(_)
        ));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let err = load_from_file("graph.json").unwrap_err();
        assert!(matches!(err, GraphMlError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load_from_file("does-not-exist.graphml").unwrap_err();
        assert!(matches!(err, GraphMlError::FileNotFound(_)));
    }
}
