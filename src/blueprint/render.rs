//! Rendering recorded exchanges as API Blueprint text

use std::fmt::{self, Write};
use std::io::BufRead;
use std::sync::Arc;

use tracing::error;

use super::query_escape;
use crate::recording::{Exchange, Headers};

/// Indent of entries inside a `+ Parameters` or `+ Headers` section
const SECTION_INDENT: &str = "    ";

/// Indent of parameter description lines
const DESCRIPTION_INDENT: &str = "      ";

/// Three blueprint indent levels: header lines and body lines
const BLOCK_INDENT: &str = "            ";

/// Render one group file
///
/// # Panics
///
/// Never in practice: formatting into a `String` cannot fail.
#[must_use]
pub fn render_group(group: &str, exchanges: &[Arc<Exchange>]) -> String {
    let mut out = String::new();
    write_group(&mut out, group, exchanges).expect("formatting into a String cannot fail");
    out
}

fn write_group(out: &mut String, group: &str, exchanges: &[Arc<Exchange>]) -> fmt::Result {
    write!(out, "# Group {group}\n\n")?;
    for exchange in exchanges {
        write_exchange(out, exchange)?;
    }
    Ok(())
}

fn write_exchange(out: &mut String, exchange: &Exchange) -> fmt::Result {
    let request = &exchange.request;
    let response = &exchange.response;

    write!(
        out,
        "## {} [{} {}]\n\n",
        exchange.name, request.method, request.effective_uri
    )?;

    if exchange.has_parameters() {
        write_parameters(out, exchange)?;
        out.push('\n');
    }

    writeln!(
        out,
        "+ Request ({})\n",
        request.content_type().unwrap_or_default()
    )?;
    write_payload(out, &request.headers, &request.body)?;

    writeln!(
        out,
        "+ Response {} ({})\n",
        response.status_code,
        response.content_type().unwrap_or_default()
    )?;
    write_payload(out, &response.headers, &response.body)
}

fn write_parameters(out: &mut String, exchange: &Exchange) -> fmt::Result {
    out.push_str("+ Parameters\n\n");

    for (key, values) in &exchange.request.query_params {
        for value in values {
            writeln!(
                out,
                "{SECTION_INDENT}+ {}: `{}` (string)",
                query_escape(key),
                value
            )?;
        }
    }

    // Always optional, whatever `required` says
    for param in &exchange.extra_params {
        writeln!(
            out,
            "{SECTION_INDENT}+ {}: `{}` ({}, optional)",
            query_escape(&param.name),
            param.example,
            param.type_label
        )?;
        if !param.description.is_empty() {
            for line in param.description.lines() {
                writeln!(out, "{DESCRIPTION_INDENT}{line}  ")?;
            }
            out.push('\n');
        }
    }

    Ok(())
}

fn write_payload(out: &mut String, headers: &Headers, body: &[u8]) -> fmt::Result {
    if !headers.is_empty() {
        writeln!(out, "{SECTION_INDENT}+ Headers\n")?;
        for (name, value) in headers {
            writeln!(out, "{BLOCK_INDENT}{name}: {value}")?;
        }
        out.push('\n');
    }

    if !body.is_empty() {
        writeln!(out, "{SECTION_INDENT}+ Body\n")?;
        writeln!(out, "{BLOCK_INDENT}")?;
        for line in body_lines(body) {
            writeln!(out, "{BLOCK_INDENT}{line}")?;
        }
        writeln!(out, "{BLOCK_INDENT}\n")?;
    }

    out.push('\n');
    Ok(())
}

/// Split a body into lines, stopping at the first unreadable line
fn body_lines(body: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    for line in body.lines() {
        match line {
            Ok(line) => lines.push(line),
            Err(e) => {
                error!(
                    "Failed to split body into lines, keeping {} lines: {}",
                    lines.len(),
                    e
                );
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{ParamSpec, RecordedRequest, RecordedResponse};
    use bytes::Bytes;
    use std::collections::BTreeMap;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn exchange() -> Exchange {
        Exchange {
            group: "Users".to_string(),
            name: "List".to_string(),
            request: RecordedRequest {
                effective_uri: "/users".to_string(),
                method: "GET".to_string(),
                headers: BTreeMap::new(),
                query_params: BTreeMap::new(),
                body: Bytes::new(),
            },
            response: RecordedResponse {
                status_code: 200,
                headers: BTreeMap::new(),
                body: Bytes::new(),
            },
            path_params: BTreeMap::new(),
            extra_params: vec![],
        }
    }

    fn render(exchange: Exchange) -> String {
        render_group("Users", &[Arc::new(exchange)])
    }

    #[test]
    fn test_minimal_exchange() {
        let output = render(exchange());

        assert_eq!(
            output,
            "# Group Users\n\n\
             ## List [GET /users]\n\n\
             + Request ()\n\n\
             \n\
             + Response 200 ()\n\n\
             \n"
        );
    }

    #[test]
    fn test_full_exchange_layout() {
        let mut exchange = exchange();
        exchange.request.method = "POST".to_string();
        exchange.request.headers = headers(&[("content-type", "application/json")]);
        exchange.request.body = Bytes::from("{\n\"a\":1\n}");
        exchange.request.query_params.insert("dry run".to_string(), vec!["1".to_string()]);
        exchange.response.status_code = 201;
        exchange.response.headers = headers(&[("content-type", "application/json")]);
        exchange.response.body = Bytes::from("{\"id\":7}");

        let output = render(exchange);

        let expected = concat!(
            "# Group Users\n\n",
            "## List [POST /users]\n\n",
            "+ Parameters\n\n",
            "    + dry+run: `1` (string)\n",
            "\n",
            "+ Request (application/json)\n\n",
            "    + Headers\n\n",
            "            content-type: application/json\n",
            "\n",
            "    + Body\n\n",
            "            \n",
            "            {\n",
            "            \"a\":1\n",
            "            }\n",
            "            \n\n",
            "\n",
            "+ Response 201 (application/json)\n\n",
            "    + Headers\n\n",
            "            content-type: application/json\n",
            "\n",
            "    + Body\n\n",
            "            \n",
            "            {\"id\":7}\n",
            "            \n\n",
            "\n",
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_extra_param_description() {
        let mut exchange = exchange();
        exchange.extra_params.push(ParamSpec::new(
            "limit",
            "integer",
            "10",
            "How many items\nto return",
            false,
        ));

        let output = render(exchange);

        assert!(output.contains(
            "    + limit: `10` (integer, optional)\n      How many items  \n      to return  \n\n"
        ));
    }

    #[test]
    fn test_required_param_renders_optional() {
        let mut exchange = exchange();
        exchange
            .extra_params
            .push(ParamSpec::new("token", "string", "abc", "", true));

        let output = render(exchange);

        assert!(output.contains("    + token: `abc` (string, optional)\n"));
        assert!(!output.contains("required"));
    }

    #[test]
    fn test_multi_valued_query() {
        let mut exchange = exchange();
        exchange.request.query_params.insert(
            "tag".to_string(),
            vec!["a".to_string(), "b".to_string()],
        );

        let output = render(exchange);

        assert!(output.contains("    + tag: `a` (string)\n    + tag: `b` (string)\n"));
    }

    #[test]
    fn test_crlf_body_lines() {
        assert_eq!(body_lines(b"one\r\ntwo\n"), vec!["one", "two"]);
    }

    #[test]
    fn test_invalid_utf8_keeps_scanned_lines() {
        assert_eq!(body_lines(b"ok\n\xff\xfe\nlater"), vec!["ok"]);
    }
}
