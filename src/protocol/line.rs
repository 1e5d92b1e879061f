//! Line framing, tokenization and response encoding

use super::types::Response;
use bytes::{BufMut, BytesMut};

/// Longest request accepted from a single read, in bytes
pub const MAX_LINE: usize = 79;

const NEWLINE: u8 = b'\n';

/// Line parser
pub struct LineParser;

impl LineParser {
    /// Extract the request line from the bytes of one read
    ///
    /// Everything after the first newline is dropped, as is a trailing
    /// carriage return. Bytes without any newline form the whole line.
    pub fn extract_line(buf: &[u8]) -> &[u8] {
        let line = match buf.iter().position(|&b| b == NEWLINE) {
            Some(end) => &buf[..end],
            None => buf,
        };
        line.strip_suffix(b"\r").unwrap_or(line)
    }

    /// Split a line on spaces
    ///
    /// Runs of spaces count as one separator, so no token is ever empty.
    pub fn tokenize(line: &[u8]) -> Vec<&[u8]> {
        line.split(|&b| b == b' ')
            .filter(|token| !token.is_empty())
            .collect()
    }
}

/// Line encoder
pub struct LineEncoder;

impl LineEncoder {
    /// Encode a response into a buffer
    pub fn encode_to(buf: &mut BytesMut, response: &Response) {
        match response {
            Response::Ok => buf.put_slice(b"OK\n"),
            Response::Value(value) => {
                buf.put_slice(value);
                buf.put_u8(NEWLINE);
            }
            Response::Nil => buf.put_u8(NEWLINE),
            Response::Integer(i) => {
                buf.put_slice(i.to_string().as_bytes());
                buf.put_u8(NEWLINE);
            }
            Response::Error(message) => {
                buf.put_slice(message.as_bytes());
                buf.put_u8(NEWLINE);
            }
            Response::NoReply => {}
        }
    }

    /// Encode a response into a new buffer
    pub fn encode(response: &Response) -> BytesMut {
        let mut buf = BytesMut::new();
        Self::encode_to(&mut buf, response);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolError;

    #[test]
    fn test_extract_line() {
        assert_eq!(LineParser::extract_line(b"GET a\n"), b"GET a");
        assert_eq!(LineParser::extract_line(b"GET a\r\n"), b"GET a");
        assert_eq!(LineParser::extract_line(b"GET a"), b"GET a");
        assert_eq!(LineParser::extract_line(b"GET a\nSET b c\n"), b"GET a");
        assert_eq!(LineParser::extract_line(b"\n"), b"");
    }

    #[test]
    fn test_tokenize() {
        let tokens = LineParser::tokenize(b"SET  key value");
        assert_eq!(tokens, vec![&b"SET"[..], &b"key"[..], &b"value"[..]]);

        assert!(LineParser::tokenize(b"").is_empty());
        assert!(LineParser::tokenize(b"   ").is_empty());
    }

    #[test]
    fn test_encode() {
        assert_eq!(&LineEncoder::encode(&Response::Ok)[..], b"OK\n");
        assert_eq!(&LineEncoder::encode(&Response::value("abc"))[..], b"abc\n");
        assert_eq!(&LineEncoder::encode(&Response::Nil)[..], b"\n");
        assert_eq!(&LineEncoder::encode(&Response::integer(-12))[..], b"-12\n");
        assert!(LineEncoder::encode(&Response::NoReply).is_empty());
    }

    #[test]
    fn test_encode_protocol_errors() {
        let unknown = Response::from(ProtocolError::UnknownCommand);
        assert_eq!(&LineEncoder::encode(&unknown)[..], b"Unknown command\n");

        // A recognized command without its argument reads the same on the wire
        let missing = Response::from(ProtocolError::MissingArgument);
        assert_eq!(missing, unknown);

        let not_int = Response::from(ProtocolError::NotAnInteger);
        assert_eq!(
            &LineEncoder::encode(&not_int)[..],
            b"ERR value is not an integer or out of range\n"
        );
    }
}
