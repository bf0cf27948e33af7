//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records and aggregates them.
///
/// Scalars seen more than once are summarised as `<key>_min`, `<key>_max`,
/// `<key>_mean` and `<key>_median`. For the other value types the most
/// recently stored value is kept.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::INFINITY, f32::min)
}

fn max(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

fn mean(vs: &[f32]) -> f32 {
    vs.iter().sum::<f32>() / vs.len() as f32
}

fn median(mut vs: Vec<f32>) -> f32 {
    vs.sort_by(|x, y| x.total_cmp(y));
    vs[vs.len() / 2]
}

impl RecordStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn aggregate_key(&self, key: &str, out: &mut Record) {
        let values = self
            .data
            .iter()
            .filter_map(|r| r.get(key))
            .collect::<Vec<_>>();

        if values.iter().all(|v| matches!(v, RecordValue::Scalar(_))) {
            let vs = values
                .iter()
                .filter_map(|v| match v {
                    RecordValue::Scalar(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>();
            if vs.len() == 1 {
                out.insert(key, RecordValue::Scalar(vs[0]));
            } else {
                out.insert(format!("{}_min", key), RecordValue::Scalar(min(&vs)));
                out.insert(format!("{}_max", key), RecordValue::Scalar(max(&vs)));
                out.insert(format!("{}_mean", key), RecordValue::Scalar(mean(&vs)));
                out.insert(format!("{}_median", key), RecordValue::Scalar(median(vs)));
            }
        } else if let Some(last) = values.last() {
            out.insert(key, (*last).clone());
        }
    }

    /// Aggregates the stored records and clears the storage.
    ///
    /// Returns `None` if nothing is stored. The returned record carries `step`
    /// under the key `"step"`.
    pub fn aggregate(&mut self, step: i64) -> Option<Record> {
        if self.data.is_empty() {
            return None;
        }

        let mut out = Record::empty();
        for key in self.get_keys() {
            self.aggregate_key(&key, &mut out);
        }
        out.insert("step", RecordValue::Scalar(step as f32));
        self.data.clear();
        Some(out)
    }
}
