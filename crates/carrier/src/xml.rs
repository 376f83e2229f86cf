//! Tolerant XML helpers shared by both adapters.
//!
//! None of these functions fail: missing or malformed input yields `None`
//! (or the input unchanged), and callers decide what that means.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Optional namespace prefix in front of an element name.
const PREFIX: &str = r"(?:[A-Za-z_][\w.\-]*:)?";

/// Attributes of an opening tag. The last character may not be `/`, so
/// self-closing elements never open a text span.
const OPEN_ATTRS: &str = r"(?:\s[^>]*[^/])?";

static FAULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s)<{PREFIX}Fault(?:\s[^>]*?)?(?:/>|>(.*?)</{PREFIX}Fault\s*>)"
    ))
    .expect("fault pattern is valid")
});

static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"<{PREFIX}([A-Za-z_][\w.\-]*){OPEN_ATTRS}>"))
        .expect("open tag pattern is valid")
});

static CLOSE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"</{PREFIX}([A-Za-z_][\w.\-]*)\s*>"))
        .expect("close tag pattern is valid")
});

static CDATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("cdata pattern is valid"));

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(lt|gt|amp|quot|apos|#[0-9]+|#[xX][0-9a-fA-F]+);")
        .expect("entity pattern is valid")
});

/// A SOAP Fault as reported by the carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
}

/// Returns the text of the first element matching any of `tag_names`.
///
/// Aliases are tried in order. Namespace prefixes and attributes are
/// ignored, CDATA sections are unwrapped, and the result is trimmed. An
/// element with no text counts as missing. Entities are not decoded.
pub fn extract_tag(xml: &str, tag_names: &[&str]) -> Option<String> {
    tag_names
        .iter()
        .find_map(|tag| inner_text(xml, tag))
}

fn inner_text(xml: &str, tag: &str) -> Option<String> {
    let start = OPEN_TAG_RE
        .captures_iter(xml)
        .find(|caps| &caps[1] == tag)?
        .get(0)?
        .end();
    let rest = &xml[start..];
    let end = CLOSE_TAG_RE
        .captures_iter(rest)
        .find(|caps| &caps[1] == tag)?
        .get(0)?
        .start();
    let raw = &rest[..end];
    let text = unwrap_cdata(raw);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Returns true if the document contains a SOAP Fault element.
pub fn contains_soap_fault(xml: &str) -> bool {
    FAULT_RE.is_match(xml)
}

/// Parses a SOAP 1.1 or 1.2 Fault, if the document contains one.
pub fn parse_soap_fault(xml: &str) -> Option<SoapFault> {
    let caps = FAULT_RE.captures(xml)?;
    let body = caps.get(1).map_or("", |m| m.as_str());

    // SOAP 1.1: <faultcode>, <faultstring>, <detail>
    // SOAP 1.2: <Code><Value>, <Reason><Text>, <Detail>
    let code = extract_tag(body, &["faultcode"])
        .or_else(|| extract_tag(body, &["Code"]).map(|c| nested_or_text(&c, "Value")))
        .map(|c| decode_xml_entities(&c))
        .unwrap_or_else(|| "UnknownFault".to_string());
    let message = extract_tag(body, &["faultstring"])
        .or_else(|| extract_tag(body, &["Reason"]).map(|r| nested_or_text(&r, "Text")))
        .map(|m| decode_xml_entities(&m))
        .unwrap_or_else(|| "SOAP fault without a reason".to_string());
    let detail = extract_tag(body, &["detail", "Detail"])
        .map(|d| flatten_markup(&d))
        .filter(|d| !d.is_empty());

    Some(SoapFault {
        code,
        message,
        detail,
    })
}

fn nested_or_text(fragment: &str, tag: &str) -> String {
    extract_tag(fragment, &[tag]).unwrap_or_else(|| flatten_markup(fragment))
}

/// Strips tags and collapses whitespace, leaving readable text.
fn flatten_markup(fragment: &str) -> String {
    let text = MARKUP_RE.replace_all(fragment, " ");
    let text = WHITESPACE_RE.replace_all(text.trim(), " ");
    decode_xml_entities(&text)
}

/// Decodes the five predefined XML entities and numeric character references.
///
/// Unknown or invalid references are left untouched. Decoding is a single
/// pass, so `&amp;lt;` becomes `&lt;`, not `<`.
pub fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    ENTITY_RE
        .replace_all(s, |caps: &Captures<'_>| {
            let entity = &caps[1];
            match entity {
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "amp" => "&".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                numeric => numeric_reference(numeric).unwrap_or_else(|| caps[0].to_string()),
            }
        })
        .into_owned()
}

fn numeric_reference(entity: &str) -> Option<String> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code).map(String::from)
}

/// Escapes text for embedding as an XML element value.
///
/// Control characters that XML 1.0 forbids are dropped.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

/// Wraps a document in a CDATA section.
///
/// An embedded `]]>` is split across two sections so it cannot terminate
/// the wrapper early.
pub fn wrap_cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

/// Replaces every CDATA section with its raw content.
pub fn unwrap_cdata(s: &str) -> String {
    if !s.contains("<![CDATA[") {
        return s.to_string();
    }
    CDATA_RE.replace_all(s, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tag_tries_aliases_in_order() {
        let xml = "<r><Barcode>111</Barcode><BarcodeNumber>222</BarcodeNumber></r>";
        assert_eq!(
            extract_tag(xml, &["BarcodeNumber", "Barcode"]).as_deref(),
            Some("222")
        );
        assert_eq!(
            extract_tag(xml, &["Missing", "Barcode"]).as_deref(),
            Some("111")
        );
        assert_eq!(extract_tag(xml, &["Missing"]), None);
    }

    #[test]
    fn test_extract_tag_ignores_prefix_attributes_and_whitespace() {
        let xml = r#"<a:ResultCode xmlns:a="urn:x" i:type="string">
            0
        </a:ResultCode>"#;
        assert_eq!(extract_tag(xml, &["ResultCode"]).as_deref(), Some("0"));
    }

    #[test]
    fn test_extract_tag_does_not_match_longer_names() {
        let xml = "<ResultCodeText>no</ResultCodeText><ResultCode>7</ResultCode>";
        assert_eq!(extract_tag(xml, &["ResultCode"]).as_deref(), Some("7"));
    }

    #[test]
    fn test_extract_tag_empty_element_counts_as_missing() {
        assert_eq!(extract_tag("<Barcode>  </Barcode>", &["Barcode"]), None);
        assert_eq!(extract_tag("<Barcode/>", &["Barcode"]), None);
    }

    #[test]
    fn test_extract_tag_skips_self_closing_elements() {
        let xml = r#"<r><Barcode a="1"/><Code>0</Code><Barcode>222</Barcode></r>"#;
        assert_eq!(extract_tag(xml, &["Barcode"]).as_deref(), Some("222"));

        let xml = "<r><Barcode/><Code>0</Code></r>";
        assert_eq!(extract_tag(xml, &["Barcode"]), None);
        assert_eq!(extract_tag(xml, &["Code"]).as_deref(), Some("0"));
    }

    #[test]
    fn test_extract_tag_unwraps_cdata() {
        let xml = "<Message><![CDATA[a < b]]></Message>";
        assert_eq!(extract_tag(xml, &["Message"]).as_deref(), Some("a < b"));
    }

    #[test]
    fn test_extract_tag_tolerates_garbage() {
        assert_eq!(extract_tag("", &["A"]), None);
        assert_eq!(extract_tag("<A>unterminated", &["A"]), None);
        assert_eq!(extract_tag("not xml at all", &["A"]), None);
        assert_eq!(extract_tag("<A>x</A>", &["(bad[regex"]), None);
    }

    #[test]
    fn test_parse_soap11_fault() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
            <s:Fault>
              <faultcode>s:Client</faultcode>
              <faultstring xml:lang="tr-TR">Kullanıcı adı &amp; şifre hatalı</faultstring>
              <detail><ExceptionDetail><Message>Login failed</Message></ExceptionDetail></detail>
            </s:Fault>
        </s:Body></s:Envelope>"#;

        assert!(contains_soap_fault(xml));
        let fault = parse_soap_fault(xml).unwrap();
        assert_eq!(fault.code, "s:Client");
        assert_eq!(fault.message, "Kullanıcı adı & şifre hatalı");
        assert_eq!(fault.detail.as_deref(), Some("Login failed"));
    }

    #[test]
    fn test_parse_soap12_fault() {
        let xml = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body>
            <env:Fault>
              <env:Code><env:Value>env:Receiver</env:Value></env:Code>
              <env:Reason><env:Text xml:lang="en">Service unavailable</env:Text></env:Reason>
            </env:Fault>
        </env:Body></env:Envelope>"#;

        let fault = parse_soap_fault(xml).unwrap();
        assert_eq!(fault.code, "env:Receiver");
        assert_eq!(fault.message, "Service unavailable");
        assert_eq!(fault.detail, None);
    }

    #[test]
    fn test_parse_soap_fault_absent() {
        assert!(!contains_soap_fault("<Body><ResultCode>0</ResultCode></Body>"));
        assert_eq!(parse_soap_fault("<Body/>"), None);
        assert_eq!(parse_soap_fault(""), None);
    }

    #[test]
    fn test_fault_without_fields_gets_placeholders() {
        let fault = parse_soap_fault("<soap:Fault></soap:Fault>").unwrap();
        assert_eq!(fault.code, "UnknownFault");
        assert!(!fault.message.is_empty());
    }

    #[test]
    fn test_self_closing_fault_is_a_fault() {
        let xml = "<s:Envelope><s:Body><s:Fault/></s:Body></s:Envelope>";
        assert!(contains_soap_fault(xml));
        let fault = parse_soap_fault(xml).unwrap();
        assert_eq!(fault.code, "UnknownFault");
        assert_eq!(fault.detail, None);

        let xml = r#"<soap:Body><soap:Fault xmlns:soap="urn:x" /></soap:Body>"#;
        assert!(contains_soap_fault(xml));
    }

    #[test]
    fn test_decode_five_entities() {
        assert_eq!(
            decode_xml_entities("&lt;a href=&quot;x&quot;&gt;Tom&apos;s &amp; co&lt;/a&gt;"),
            "<a href=\"x\">Tom's & co</a>"
        );
    }

    #[test]
    fn test_decode_is_single_pass() {
        assert_eq!(decode_xml_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_decode_numeric_and_unknown() {
        assert_eq!(decode_xml_entities("&#34;&#x22;"), "\"\"");
        assert_eq!(decode_xml_entities("&nbsp; & &#xD800;"), "&nbsp; & &#xD800;");
    }

    #[test]
    fn test_escape_then_decode_restores_text() {
        let text = "Atatürk Cad. No:5 <B Blok> & \"Daire\" 'Üst'";
        assert_eq!(decode_xml_entities(&escape_xml(text)), text);
        assert!(!escape_xml(text).contains('<'));
    }

    #[test]
    fn test_escape_drops_forbidden_control_chars() {
        assert_eq!(escape_xml("a\u{0}b\u{1b}c\nd"), "abc\nd");
    }

    #[test]
    fn test_cdata_wrap_and_unwrap() {
        let doc = "<LoginInfo><UserName>u</UserName></LoginInfo>";
        assert_eq!(
            wrap_cdata(doc),
            "<![CDATA[<LoginInfo><UserName>u</UserName></LoginInfo>]]>"
        );
        assert_eq!(unwrap_cdata(&wrap_cdata(doc)), doc);
    }

    #[test]
    fn test_cdata_splits_terminator() {
        let tricky = "x]]>y";
        let wrapped = wrap_cdata(tricky);
        assert_eq!(wrapped, "<![CDATA[x]]]]><![CDATA[>y]]>");
        assert_eq!(unwrap_cdata(&wrapped), tricky);
    }
}
