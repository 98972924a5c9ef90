use serde::de::DeserializeOwned;

#[derive(Debug, PartialEq)]
pub struct ServerSentEvent<T> {
    pub id: Option<String>,
    pub event: Option<String>,
    pub retry: Option<usize>,
    pub comment: Option<String>,
    pub data: Option<T>,
}

impl<T> ServerSentEvent<T>
where
    T: DeserializeOwned,
{
    /// Parses a single event block. Multiple `data:` lines are joined with a newline before the
    /// payload is deserialized.
    pub fn parse(s: &str) -> Result<ServerSentEvent<T>, serde_json::Error> {
        let mut id = None;
        let mut event = None;
        let mut retry = None;
        let mut comment = None;
        let mut data_lines = Vec::new();

        for line in s.lines() {
            if let Some(value) = line.strip_prefix("id:") {
                id = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("event:") {
                event = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("retry:") {
                retry = value.trim().parse::<usize>().ok();
            } else if let Some(value) = line.strip_prefix(':') {
                comment = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("data:") {
                data_lines.push(value.trim());
            }
        }

        let data = if data_lines.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&data_lines.join("\n"))?)
        };

        Ok(ServerSentEvent {
            id,
            event,
            retry,
            comment,
            data,
        })
    }
}

/// Collects stream chunks and hands out complete event blocks. A chunk can end in the middle of
/// an event (or of a UTF-8 sequence), events are only complete after a blank line.
#[derive(Debug, Default)]
pub struct EventBuffer {
    pending: Vec<u8>,
}

impl EventBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend(chunk.iter().filter(|&&byte| byte != b'\r'));

        let mut blocks = Vec::new();
        while let Some(end) = self.pending.windows(2).position(|window| window == b"\n\n") {
            let block = self.pending.drain(..end + 2).collect::<Vec<_>>();
            let text = String::from_utf8_lossy(&block).trim().to_string();
            if !text.is_empty() {
                blocks.push(text);
            }
        }

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PositionSample;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("id: 42", ServerSentEvent { id: Some("42".to_string()), event: None, retry: None, comment: None, data: None, })]
    #[case("event: position", ServerSentEvent { id: None, event: Some("position".to_string()), retry: None, comment: None, data: None, })]
    #[case("retry: 1337", ServerSentEvent { id: None, event: None, retry: Some(1337), comment: None, data: None, })]
    #[case("retry: soon", ServerSentEvent { id: None, event: None, retry: None, comment: None, data: None, })]
    #[case(": keepalive", ServerSentEvent { id: None, event: None, retry: None, comment: Some("keepalive".to_string()), data: None, })]
    #[case(r#"data: { "latitude": 47.5, "longitude": 8.4 } "#, ServerSentEvent { id: None, event: None, retry: None, comment: None, data: Some(PositionSample::new(47.5, 8.4, None)), })]
    fn parses_a_single_field(#[case] data: &str, #[case] expected: ServerSentEvent<PositionSample>) -> Result<(), serde_json::Error> {
        let result: ServerSentEvent<PositionSample> = ServerSentEvent::parse(data)?;

        assert_eq!(result, expected);
        Ok(())
    }

    #[test]
    fn joins_multiple_data_lines() -> Result<(), serde_json::Error> {
        let data = "event: position\ndata: { \"latitude\": 47.5,\ndata: \"longitude\": 8.4 }";

        let result: ServerSentEvent<PositionSample> = ServerSentEvent::parse(data)?;

        assert_eq!(result.event, Some("position".to_string()));
        assert_eq!(result.data, Some(PositionSample::new(47.5, 8.4, None)));
        Ok(())
    }

    #[test]
    fn parse_fails_if_data_deserialization_fails() {
        let result = ServerSentEvent::<PositionSample>::parse("data: no json");

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "expected ident at line 1 column 2");
    }

    #[test]
    fn buffer_returns_nothing_until_an_event_is_complete() {
        let mut buffer = EventBuffer::default();

        assert!(buffer.push(b"data: {\"latitude\"").is_empty());
        assert!(buffer.push(b": 47.5, \"longitude\": 8.4}\n").is_empty());
        assert_eq!(buffer.push(b"\n"), vec!["data: {\"latitude\": 47.5, \"longitude\": 8.4}".to_string()]);
    }

    #[test]
    fn buffer_splits_a_chunk_with_several_events() {
        let mut buffer = EventBuffer::default();

        let blocks = buffer.push(b"id: 1\r\ndata: 1\r\n\r\nid: 2\ndata: 2\n\nid: 3");

        assert_eq!(blocks, vec!["id: 1\ndata: 1".to_string(), "id: 2\ndata: 2".to_string()]);
        assert_eq!(buffer.push(b"\n\n"), vec!["id: 3".to_string()]);
    }

    #[test]
    fn buffer_keeps_multi_byte_characters_split_across_chunks() {
        let mut buffer = EventBuffer::default();
        let bytes = ": 📍\n\n".as_bytes();

        assert!(buffer.push(&bytes[..4]).is_empty());
        assert_eq!(buffer.push(&bytes[4..]), vec![": 📍".to_string()]);
    }
}
