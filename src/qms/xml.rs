//! Minimal XML element tree for SOAP responses
//!
//! Elements are keyed by local name; namespace prefixes are dropped.

use anyhow::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

/// Parsed XML element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    /// Carries `xsi:nil="true"`
    pub nil: bool,
    pub children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Element {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Default::default()
        };

        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.local_name().as_ref() == b"nil" {
                element.nil = attr.unescape_value()?.trim() == "true";
            }
        }

        Ok(element)
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First descendant with the given local name, depth-first
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Text of a direct child, `None` when missing, nil or empty
    pub fn value(&self, name: &str) -> Option<&str> {
        self.child(name)
            .filter(|c| !c.nil && !c.text.is_empty())
            .map(|c| c.text.as_str())
    }
}

/// Parse a document into a synthetic `#document` root element
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element {
        name: "#document".to_string(),
        ..Default::default()
    }];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    anyhow::bail!("Unbalanced closing tag in XML document");
                }
                if let Some(element) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        anyhow::bail!("Unexpected end of XML document");
    }

    Ok(stack.remove(0))
}

/// Escape text for element content
pub fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TASK_INFO: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <GetTaskResponse xmlns="http://ws.qliktech.com/QMS/11/">
      <GetTaskResult xmlns:a="http://schemas.datacontract.org/2004/07/PIX.QMSAPI.DataObjects" xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
        <a:Enabled>true</a:Enabled>
        <a:ID>3f2504e0-4f89-11d3-9a0c-0305e82c3301</a:ID>
        <a:Name>Reload &amp; Distribute</a:Name>
        <a:QDSID i:nil="true"/>
      </GetTaskResult>
    </GetTaskResponse>
  </s:Body>
</s:Envelope>"#;

    #[test]
    fn test_parse_drops_prefixes() {
        let doc = parse(TASK_INFO).unwrap();
        let result = doc.find("GetTaskResult").unwrap();
        assert_eq!(result.value("Enabled"), Some("true"));
        assert_eq!(result.value("Name"), Some("Reload & Distribute"));
    }

    #[test]
    fn test_nil_is_absent() {
        let doc = parse(TASK_INFO).unwrap();
        let result = doc.find("GetTaskResult").unwrap();
        assert!(result.child("QDSID").unwrap().nil);
        assert_eq!(result.value("QDSID"), None);
        assert_eq!(result.value("Missing"), None);
    }

    #[test]
    fn test_truncated_document_fails() {
        assert!(parse("<a><b>text</b>").is_err());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & c>"), "a&lt;b &amp; c&gt;");
    }
}
