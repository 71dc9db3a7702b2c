use std::io::{self, Read};

use loadline::http::error::{ConnectionError, ProtocolError};
use loadline::http::framer::{Frame, Framer, HEADER_BOUNDARY, MAX_HEAD, MAX_REQUEST_BODY, search};

/// Hands out the wrapped bytes at most `chunk` at a time.
struct Trickle<'a> {
    data: &'a [u8],
    pos: usize,
    chunk: usize,
}

impl<'a> Trickle<'a> {
    fn new(data: &'a [u8], chunk: usize) -> Self {
        Self { data, pos: 0, chunk }
    }
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\n\r\nhello world";
const RESPONSE_HEAD_LEN: usize = 39;
const NEXT: &[u8] = b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n";

#[test]
fn test_header_boundary_independent_of_chunk_size() {
    let request = b"GET /index.html HTTP/1.1\r\nHost: localhost\r\nUser-Agent: test\r\n\r\n";

    let mut whole = Framer::new();
    let expected = whole.feed(request);
    assert_eq!(expected, Some(request.len()));

    for chunk in 1..=request.len() {
        let mut framer = Framer::new();
        for piece in request.chunks(chunk) {
            framer.feed(piece);
        }
        assert_eq!(framer.body_offset(), expected, "chunk size {chunk}");
    }
}

#[test]
fn test_response_stops_exactly_after_content_length() {
    let mut stream = RESPONSE.to_vec();
    stream.extend_from_slice(NEXT);

    // Reads smaller than the body can never overshoot the message.
    for chunk in 1..=11 {
        let mut reader = Trickle::new(&stream, chunk);
        let mut framer = Framer::new();

        let frame = framer.read_response(&mut reader).unwrap();
        assert_eq!(
            frame,
            Frame::Complete {
                body_offset: RESPONSE_HEAD_LEN,
                len: RESPONSE.len()
            },
            "chunk size {chunk}"
        );
        assert_eq!(reader.pos, RESPONSE.len(), "chunk size {chunk}");
        assert_eq!(&framer.buffer()[RESPONSE_HEAD_LEN..RESPONSE.len()], b"hello world");
    }
}

#[test]
fn test_surplus_bytes_are_kept_for_the_next_message() {
    let mut stream = RESPONSE.to_vec();
    stream.extend_from_slice(NEXT);

    for chunk in [1, 7, 40, 4096] {
        let mut reader = Trickle::new(&stream, chunk);
        let mut framer = Framer::new();

        let Frame::Complete { len, .. } = framer.read_response(&mut reader).unwrap() else {
            panic!("first response incomplete");
        };
        framer.consume(len);

        let frame = framer.read_response(&mut reader).unwrap();
        assert_eq!(
            frame,
            Frame::Complete {
                body_offset: NEXT.len(),
                len: NEXT.len()
            },
            "chunk size {chunk}"
        );
    }
}

#[test]
fn test_missing_content_length() {
    let mut reader = Trickle::new(b"HTTP/1.1 200 OK\r\nServer: x\r\n\r\nbody", 4096);
    let result = Framer::new().read_response(&mut reader);

    assert!(matches!(
        result,
        Err(ConnectionError::Protocol(ProtocolError::MissingContentLength))
    ));
}

#[test]
fn test_invalid_content_length() {
    let mut reader = Trickle::new(b"HTTP/1.1 200 OK\r\nContent-Length: abc\r\n\r\n", 4096);
    let result = Framer::new().read_response(&mut reader);

    match result {
        Err(ConnectionError::Protocol(ProtocolError::InvalidContentLength { value })) => {
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_peer_closes_before_head_ends() {
    let mut reader = Trickle::new(b"HTTP/1.1 200 OK\r\nContent-", 3);
    let result = Framer::new().read_response(&mut reader);

    assert!(matches!(
        result,
        Err(ConnectionError::Protocol(ProtocolError::ShortMessage { received: 25 }))
    ));
}

#[test]
fn test_peer_closes_during_body() {
    let mut reader = Trickle::new(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc", 5);
    let mut framer = Framer::new();

    let frame = framer.read_response(&mut reader).unwrap();
    assert_eq!(
        frame,
        Frame::Closed {
            body_offset: Some(RESPONSE_HEAD_LEN),
            buffered: RESPONSE_HEAD_LEN + 3
        }
    );
    assert_eq!(framer.body(), b"abc");
}

#[test]
fn test_request_without_body_completes_at_boundary() {
    let first = b"GET /a.html HTTP/1.1\r\nHost: localhost\r\n\r\n";
    let second = b"GET /b.html HTTP/1.1\r\n\r\n";
    let mut stream = first.to_vec();
    stream.extend_from_slice(second);

    let mut reader = Trickle::new(&stream, 4096);
    let mut framer = Framer::new();

    let frame = framer.read_request(&mut reader).unwrap();
    assert_eq!(
        frame,
        Frame::Complete {
            body_offset: first.len(),
            len: first.len()
        }
    );

    framer.consume(first.len());
    assert_eq!(framer.body_offset(), Some(second.len()));
}

#[test]
fn test_request_with_declared_body_waits_for_it() {
    let request = b"POST /form HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let mut reader = Trickle::new(request, 3);
    let mut framer = Framer::new();

    let frame = framer.read_request(&mut reader).unwrap();
    assert_eq!(
        frame,
        Frame::Complete {
            body_offset: request.len() - 5,
            len: request.len()
        }
    );
}

#[test]
fn test_request_on_closed_connection() {
    let mut reader = Trickle::new(b"", 4096);
    let frame = Framer::new().read_request(&mut reader).unwrap();

    assert_eq!(
        frame,
        Frame::Closed {
            body_offset: None,
            buffered: 0
        }
    );
}

#[test]
fn test_content_length_split_across_chunks() {
    let mut framer = Framer::new();
    framer.feed(b"HTTP/1.1 200 OK\r\nContent-Le");
    framer.feed(b"ngth: 1");
    framer.feed(b"1\r\n\r\nhello");

    assert_eq!(framer.content_length(), Ok(Some(11)));
    assert_eq!(framer.body(), b"hello");
}

#[test]
fn test_content_length_name_is_case_sensitive() {
    let mut framer = Framer::new();
    framer.feed(b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\n");

    assert_eq!(framer.content_length(), Ok(None));
}

#[test]
fn test_content_length_not_confused_with_similar_header() {
    let mut framer = Framer::new();
    framer.feed(b"HTTP/1.1 200 OK\r\nX-Content-Length: 99\r\nContent-Length: 4\r\n\r\n");

    assert_eq!(framer.content_length(), Ok(Some(4)));
}

#[test]
fn test_search_window_covers_overlap() {
    let buf = b"abc\r\n\r\n";
    assert_eq!(search(buf, 2, HEADER_BOUNDARY), Some(7));
    assert_eq!(search(buf, 0, HEADER_BOUNDARY), None);
}

#[test]
fn test_read_limit_follows_missing_body_bytes() {
    let mut framer = Framer::new();
    assert_eq!(framer.read_limit(4096, 11), 4096);
    assert!(!framer.body_complete(0));

    framer.feed(&RESPONSE[..RESPONSE_HEAD_LEN + 4]);
    assert_eq!(framer.read_limit(4096, 11), 7);
    assert_eq!(framer.read_limit(3, 11), 3);
    assert!(!framer.body_complete(11));

    framer.feed(&RESPONSE[RESPONSE_HEAD_LEN + 4..]);
    assert_eq!(framer.read_limit(4096, 11), 0);
    assert!(framer.body_complete(11));
}

#[test]
fn test_request_head_without_boundary_is_capped() {
    let flood = vec![b'a'; MAX_HEAD + 1];
    let mut reader = Trickle::new(&flood, 4096);
    let mut framer = Framer::new();

    let err = framer.read_request(&mut reader).unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::Protocol(ProtocolError::HeadTooLarge { limit: MAX_HEAD })
    ));
    assert_eq!(reader.pos, flood.len());
}

#[test]
fn test_head_up_to_the_cap_is_accepted() {
    let mut request = b"GET / HTTP/1.1\r\nX-Pad: ".to_vec();
    request.resize(MAX_HEAD - 4, b'p');
    request.extend_from_slice(HEADER_BOUNDARY);
    let mut framer = Framer::new();

    let frame = framer.read_request(&mut Trickle::new(&request, 4096)).unwrap();
    assert_eq!(
        frame,
        Frame::Complete {
            body_offset: MAX_HEAD,
            len: MAX_HEAD
        }
    );
}

#[test]
fn test_response_head_without_boundary_is_capped() {
    let mut flood = b"HTTP/1.1 200 OK\r\n".to_vec();
    flood.resize(MAX_HEAD * 2, b'x');
    let mut framer = Framer::new();

    let err = framer.read_response(&mut Trickle::new(&flood, 4096)).unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::Protocol(ProtocolError::HeadTooLarge { .. })
    ));
}

#[test]
fn test_oversized_request_body_is_rejected() {
    let request = format!(
        "POST /upload HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        MAX_REQUEST_BODY + 1
    );
    let mut framer = Framer::new();

    let err = framer
        .read_request(&mut Trickle::new(request.as_bytes(), 4096))
        .unwrap_err();
    assert!(matches!(
        err,
        ConnectionError::Protocol(ProtocolError::BodyTooLarge { declared, .. })
            if declared == MAX_REQUEST_BODY + 1
    ));
}
