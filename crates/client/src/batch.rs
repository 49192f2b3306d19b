//! Arrow IPC stream decoding for query results.
//!
//! The query endpoint answers with a complete Arrow IPC stream. The body is
//! buffered and parsed eagerly into one record batch.

use std::io::Cursor;

use arrow::compute::concat_batches;
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;

use crate::error::ClientError;

/// Parse an Arrow IPC stream into a single batch.
///
/// Multiple stream batches are concatenated. A stream with a schema but no
/// batches yields an empty batch with that schema.
pub fn deserialize_batch(bytes: &[u8]) -> Result<RecordBatch, ClientError> {
    if bytes.is_empty() {
        return Err(ClientError::Decode("empty response body".to_string()));
    }

    let reader = StreamReader::try_new(Cursor::new(bytes), None)
        .map_err(|e| ClientError::Decode(format!("bad stream header: {e}")))?;
    let schema = reader.schema();

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ClientError::Decode(format!("bad record batch: {e}")))?;

    concat_batches(&schema, &batches)
        .map_err(|e| ClientError::Decode(format!("cannot concatenate batches: {e}")))
}

/// Write a batch as an Arrow IPC stream.
pub fn serialize_batch(batch: &RecordBatch) -> Result<Vec<u8>, ClientError> {
    let mut buf = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buf, &batch.schema())
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        writer
            .write(batch)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
    }
    Ok(buf)
}

/// Render a batch as an ASCII table for logs.
pub fn format_batch(batch: &RecordBatch) -> Result<String, ClientError> {
    arrow::util::pretty::pretty_format_batches(std::slice::from_ref(batch))
        .map(|table| table.to_string())
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Rows as JSON objects keyed by column name.
pub fn batch_to_json_rows(batch: &RecordBatch) -> Result<Vec<serde_json::Value>, ClientError> {
    if batch.num_rows() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = arrow::json::ArrayWriter::new(Vec::new());
    writer
        .write_batches(&[batch])
        .map_err(|e| ClientError::Decode(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| ClientError::Decode(e.to_string()))?;

    let bytes = writer.into_inner();
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    fn planet_batch(orders: Vec<i64>, planets: Vec<&str>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("PROOF_ORDER", DataType::Int64, false),
            Field::new("PLANET", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(orders)),
                Arc::new(StringArray::from(planets)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_roundtrip_keeps_names_and_values() {
        let batch = planet_batch(vec![0, 1], vec!["Mars", "Venus"]);
        let bytes = serialize_batch(&batch).unwrap();
        let decoded = deserialize_batch(&bytes).unwrap();

        let names: Vec<_> = decoded.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, vec!["PROOF_ORDER", "PLANET"]);
        assert_eq!(decoded, batch);

        let planets = decoded.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(planets.value(0), "Mars");
        assert_eq!(planets.value(1), "Venus");
    }

    #[test]
    fn test_multiple_batches_are_concatenated() {
        let first = planet_batch(vec![0], vec!["Earth"]);
        let second = planet_batch(vec![1, 2], vec!["Saturn", "Uranus"]);

        let mut buf = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut buf, &first.schema()).unwrap();
            writer.write(&first).unwrap();
            writer.write(&second).unwrap();
            writer.finish().unwrap();
        }

        let decoded = deserialize_batch(&buf).unwrap();
        assert_eq!(decoded.num_rows(), 3);
        let orders = decoded.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(orders.values().to_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn test_schema_only_stream_is_empty_batch() {
        let batch = planet_batch(vec![], vec![]);
        let bytes = serialize_batch(&batch).unwrap();
        let decoded = deserialize_batch(&bytes).unwrap();
        assert_eq!(decoded.num_rows(), 0);
        assert_eq!(decoded.num_columns(), 2);
    }

    #[test]
    fn test_empty_body_rejected() {
        let err = deserialize_batch(&[]).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        // continuation marker, 8-byte metadata length, then junk metadata
        let err = deserialize_batch(b"\xff\xff\xff\xff\x08\x00\x00\x00garbage!").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_format_batch_contains_values() {
        let batch = planet_batch(vec![0], vec!["Neptune"]);
        let table = format_batch(&batch).unwrap();
        assert!(table.contains("PROOF_ORDER"));
        assert!(table.contains("Neptune"));
    }

    #[test]
    fn test_json_rows() {
        let batch = planet_batch(vec![0], vec!["Jupiter"]);
        let rows = batch_to_json_rows(&batch).unwrap();
        assert_eq!(rows, vec![serde_json::json!({"PROOF_ORDER": 0, "PLANET": "Jupiter"})]);
    }
}
