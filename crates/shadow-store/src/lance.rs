//! Lance-backed embedding store, one row per chunk vector.
//!
//! Rows carry the chunk-set hash and embedder id of the set they belong to;
//! writing a document replaces all of its rows.

use anyhow::{anyhow, Result};
use arrow_array::cast::AsArray;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use shadow_core::traits::EmbeddingStore;
use shadow_core::types::{EmbeddingMap, EmbeddingSet};
use std::sync::Arc;

pub const DEFAULT_TABLE: &str = "chunk_embeddings";

pub fn build_embeddings_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("doc_id", DataType::Utf8, false),
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("chunk_set_hash", DataType::Utf8, false),
        Field::new("embedder_id", DataType::Utf8, false),
        Field::new("created_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}

fn quote(s: &str) -> String { format!("'{}'", s.replace('\'', "''")) }

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("missing {} column", name))
}

pub struct LanceEmbeddingStore {
    conn: Connection,
    table: String,
    dim: i32,
}

impl LanceEmbeddingStore {
    pub async fn open(uri: &str, dim: usize) -> Result<Self> {
        let conn = connect(uri).execute().await?;
        Ok(Self { conn, table: DEFAULT_TABLE.to_string(), dim: i32::try_from(dim)? })
    }

    async fn has_table(&self) -> Result<bool> { Ok(self.conn.table_names().execute().await?.contains(&self.table)) }

    async fn ensure_table(&self) -> Result<()> {
        if self.has_table().await? { return Ok(()); }
        let schema = build_embeddings_schema(self.dim);
        let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
        self.conn.create_table(&self.table, Box::new(iter)).execute().await?;
        Ok(())
    }

    async fn rows_for(&self, doc_id: &str) -> Result<Vec<RecordBatch>> {
        if !self.has_table().await? { return Ok(vec![]); }
        let t = self.conn.open_table(&self.table).execute().await?;
        let stream = t.query().only_if(format!("doc_id = {}", quote(doc_id))).execute().await?;
        let batches: Vec<RecordBatch> = stream.try_collect().await?;
        Ok(batches)
    }
}

#[async_trait]
impl EmbeddingStore for LanceEmbeddingStore {
    async fn exists(&self, doc_id: &str) -> Result<bool> {
        Ok(self.rows_for(doc_id).await?.iter().any(|b| b.num_rows() > 0))
    }

    async fn read(&self, doc_id: &str) -> Result<Option<EmbeddingSet>> {
        let mut set: Option<EmbeddingSet> = None;
        for batch in self.rows_for(doc_id).await? {
            let chunk_ids = string_col(&batch, "chunk_id")?;
            let hashes = string_col(&batch, "chunk_set_hash")?;
            let eids = string_col(&batch, "embedder_id")?;
            let vec_col = batch
                .column_by_name("vector")
                .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
                .ok_or_else(|| anyhow!("missing vector column"))?;
            for i in 0..batch.num_rows() {
                let entry = set.get_or_insert_with(|| EmbeddingSet {
                    chunk_set_hash: hashes.value(i).to_string(),
                    embedder_id: eids.value(i).to_string(),
                    vectors: EmbeddingMap::new(),
                });
                let list = vec_col.value(i);
                let vals = list.as_primitive::<arrow_array::types::Float32Type>().values().to_vec();
                entry.vectors.insert(chunk_ids.value(i).to_string(), vals);
            }
        }
        Ok(set)
    }

    async fn write(&self, doc_id: &str, set: &EmbeddingSet) -> Result<()> {
        self.ensure_table().await?;
        let t = self.conn.open_table(&self.table).execute().await?;
        t.delete(&format!("doc_id = {}", quote(doc_id))).await?;
        if set.vectors.is_empty() { return Ok(()); }

        let mut chunk_ids = Vec::new();
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for (id, v) in &set.vectors {
            if v.len() != self.dim as usize {
                return Err(anyhow!("dim mismatch for {}: got {} expected {}", id, v.len(), self.dim));
            }
            chunk_ids.push(id.clone());
            vectors.push(Some(v.iter().map(|&x| Some(x)).collect()));
        }
        let n = chunk_ids.len();
        let now = Utc::now().timestamp_millis();
        let schema = build_embeddings_schema(self.dim);
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![doc_id.to_string(); n])),
                Arc::new(StringArray::from(chunk_ids)),
                Arc::new(StringArray::from(vec![set.chunk_set_hash.clone(); n])),
                Arc::new(StringArray::from(vec![set.embedder_id.clone(); n])),
                Arc::new(TimestampMillisecondArray::from(vec![now; n])),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, self.dim)),
            ],
        )?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        t.add(reader).execute().await?;
        Ok(())
    }
}
