use std::collections::HashMap;
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{CTE_NS, DSIG_NS, NFE_NS};
use crate::core::NotaError;

/// One element of the parsed tree.
///
/// `raw_name` keeps the qualified name exactly as written in the source so
/// serialization preserves the original prefixes; `local` and `namespace`
/// carry the resolved identity used by lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    raw_name: String,
    local: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

/// A parsed document: the root element plus nothing else.
///
/// Comments and processing instructions are dropped on parse; the documents
/// this crate handles never carry meaningful ones.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
}

impl Element {
    /// Resolved local name (without prefix).
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Resolved namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or add an attribute.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Replace the text content.
    pub fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }

    /// Text content, or "" when absent.
    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    fn matches(&self, local: &str, ns: Option<&str>) -> bool {
        self.local == local
            && match ns {
                Some(uri) => self.namespace.as_deref() == Some(uri),
                None => self.namespace.is_none(),
            }
    }

    fn child_in_ns(&self, local: &str, ns: Option<&str>) -> Option<&Element> {
        self.children.iter().find(|c| c.matches(local, ns))
    }

    fn resolve_in_ns(&self, path: &str, ns: Option<&str>) -> Option<&Element> {
        let mut cur = self;
        for seg in path.split('/') {
            cur = cur.child_in_ns(seg, ns)?;
        }
        Some(cur)
    }

    fn resolve_deep_in_ns(&self, path: &str, ns: Option<&str>) -> Option<&Element> {
        let (head, rest) = match path.split_once('/') {
            Some((h, r)) => (h, Some(r)),
            None => (path, None),
        };
        // Pre-order descendant search for the head segment, then direct
        // children for the remaining segments.
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(el) = stack.pop() {
            if el.matches(head, ns) {
                let hit = match rest {
                    Some(r) => el.resolve_in_ns(r, ns),
                    None => Some(el),
                };
                if hit.is_some() {
                    return hit;
                }
            }
            stack.extend(el.children.iter().rev());
        }
        None
    }

    /// Resolve a slash-separated path of direct children, probing the NF-e
    /// namespace, then the CT-e namespace, then unqualified names.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.resolve_in_ns(path, Some(NFE_NS))
            .or_else(|| self.resolve_in_ns(path, Some(CTE_NS)))
            .or_else(|| self.resolve_in_ns(path, None))
    }

    /// Like [`Element::find`], returning a mutable reference.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        // Locate via the shared probe, then re-walk mutably.
        let ns = [Some(NFE_NS), Some(CTE_NS), None]
            .into_iter()
            .find(|ns| self.resolve_in_ns(path, *ns).is_some())?;
        let mut cur = self;
        for seg in path.split('/') {
            cur = cur.children.iter_mut().find(|c| c.matches(seg, ns))?;
        }
        Some(cur)
    }

    /// All direct-children matches for a path, with the same namespace probe
    /// (falling back to the next variant only when a probe yields nothing).
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        for ns in [Some(NFE_NS), Some(CTE_NS), None] {
            let found = self.collect_in_ns(path, ns);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn collect_in_ns<'a>(&'a self, path: &str, ns: Option<&str>) -> Vec<&'a Element> {
        let mut level: Vec<&Element> = vec![self];
        for seg in path.split('/') {
            level = level
                .iter()
                .flat_map(|el| el.children.iter().filter(|c| c.matches(seg, ns)))
                .collect();
        }
        level
    }

    /// Mutable iteration over direct children with a given local name,
    /// namespace-tolerant.
    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.children.iter_mut().filter(move |c| {
            c.local == local
                && matches!(
                    c.namespace.as_deref(),
                    Some(NFE_NS) | Some(CTE_NS) | None
                )
        })
    }

    /// Deep search: the first path segment may sit at any depth below this
    /// element, the rest must be direct children. Same namespace probe.
    pub fn find_deep(&self, path: &str) -> Option<&Element> {
        self.resolve_deep_in_ns(path, Some(NFE_NS))
            .or_else(|| self.resolve_deep_in_ns(path, Some(CTE_NS)))
            .or_else(|| self.resolve_deep_in_ns(path, None))
    }

    /// Like [`Element::find_deep`], returning a mutable reference.
    pub fn find_deep_mut(&mut self, path: &str) -> Option<&mut Element> {
        let ns = [Some(NFE_NS), Some(CTE_NS), None]
            .into_iter()
            .find(|ns| self.resolve_deep_in_ns(path, *ns).is_some())?;

        let (head, rest) = match path.split_once('/') {
            Some((h, r)) => (h, Some(r)),
            None => (path, None),
        };
        let mut stack: Vec<&mut Element> = self.children.iter_mut().rev().collect();
        while let Some(el) = stack.pop() {
            // Check immutably first so a head match with a dead-end tail
            // still gets its subtree searched.
            let is_hit = el.matches(head, ns)
                && rest.is_none_or(|r| el.resolve_in_ns(r, ns).is_some());
            if is_hit {
                let mut cur = el;
                if let Some(r) = rest {
                    for seg in r.split('/') {
                        match cur.children.iter_mut().find(|c| c.matches(seg, ns)) {
                            Some(next) => cur = next,
                            None => return None,
                        }
                    }
                }
                return Some(cur);
            }
            stack.extend(el.children.iter_mut().rev());
        }
        None
    }
}

impl Document {
    /// Parse an XML string into a tree.
    pub fn parse(xml: &str) -> Result<Document, NotaError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        // Parallel stacks: open elements and their namespace scopes.
        let mut elements: Vec<Element> = Vec::new();
        let mut scopes: Vec<HashMap<String, String>> = vec![HashMap::new()];
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let (el, scope) = open_element(e, scopes.last().unwrap())?;
                    elements.push(el);
                    scopes.push(scope);
                }
                Ok(Event::Empty(ref e)) => {
                    let (el, _) = open_element(e, scopes.last().unwrap())?;
                    attach(&mut elements, &mut root, el)?;
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map_err(NotaError::xml)?;
                    if let Some(top) = elements.last_mut() {
                        match &mut top.text {
                            Some(existing) => existing.push_str(&text),
                            None => top.text = Some(text.into_owned()),
                        }
                    }
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if let Some(top) = elements.last_mut() {
                        top.text.get_or_insert_default().push_str(&text);
                    }
                }
                Ok(Event::End(_)) => {
                    scopes.pop();
                    let el = elements
                        .pop()
                        .ok_or_else(|| NotaError::Xml("unbalanced end tag".into()))?;
                    attach(&mut elements, &mut root, el)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // declaration, comments, PIs
                Err(e) => return Err(NotaError::xml(e)),
            }
        }

        let root = root.ok_or_else(|| NotaError::Xml("document has no root element".into()))?;
        Ok(Document { root })
    }

    /// Render as a compact single-line document.
    ///
    /// Original namespace declarations are preserved, except that `xmlns:ds`
    /// declarations are dropped, `ds:`-prefixed element names lose their
    /// prefix, and the `Signature` element gains the signature namespace as
    /// its default declaration.
    pub fn to_xml_string(&self) -> Result<String, NotaError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(NotaError::xml)?;
        write_element(&mut writer, &self.root)?;
        let buf = writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(NotaError::xml)
    }
}

fn open_element(
    e: &BytesStart<'_>,
    parent_scope: &HashMap<String, String>,
) -> Result<(Element, HashMap<String, String>), NotaError> {
    let raw_name = String::from_utf8(e.name().as_ref().to_vec()).map_err(NotaError::xml)?;

    let mut attributes = Vec::new();
    let mut scope = parent_scope.clone();
    for attr in e.attributes() {
        let attr = attr.map_err(NotaError::xml)?;
        let key = String::from_utf8(attr.key.as_ref().to_vec()).map_err(NotaError::xml)?;
        let value = attr
            .unescape_value()
            .map_err(NotaError::xml)?
            .into_owned();
        if key == "xmlns" {
            scope.insert(String::new(), value.clone());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value.clone());
        }
        attributes.push((key, value));
    }

    let (prefix, local) = match raw_name.split_once(':') {
        Some((p, l)) => (p.to_string(), l.to_string()),
        None => (String::new(), raw_name.clone()),
    };
    let namespace = scope.get(&prefix).cloned();

    Ok((
        Element {
            raw_name,
            local,
            namespace,
            attributes,
            text: None,
            children: Vec::new(),
        },
        scope,
    ))
}

fn attach(
    elements: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), NotaError> {
    match elements.last_mut() {
        Some(parent) => parent.children.push(el),
        None => {
            if root.is_some() {
                return Err(NotaError::Xml("multiple root elements".into()));
            }
            *root = Some(el);
        }
    }
    Ok(())
}

fn write_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    el: &Element,
) -> Result<(), NotaError> {
    let in_dsig = el.namespace.as_deref() == Some(DSIG_NS);
    let had_prefix = el.raw_name.contains(':');

    // Strip the signature prefix on output.
    let name: &str = if in_dsig && had_prefix {
        &el.local
    } else {
        &el.raw_name
    };

    let mut start = BytesStart::new(name);
    for (k, v) in &el.attributes {
        // Drop prefix declarations that point at the signature namespace.
        if k.starts_with("xmlns:") && v == DSIG_NS {
            continue;
        }
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if in_dsig && had_prefix && el.local == "Signature" {
        start.push_attribute(("xmlns", DSIG_NS));
    }

    if el.text.is_none() && el.children.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(NotaError::xml)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(NotaError::xml)?;
    if let Some(text) = &el.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(NotaError::xml)?;
    }
    for child in &el.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(NotaError::xml)?;
    Ok(())
}
