use std::collections::BTreeMap;

use crate::execution::Op;

/// Fenwick tree (binary indexed tree) over bucket counts: point
/// update and prefix sum in O(log n).
struct Fenwick {
    tree: Vec<i64>,
}

impl Fenwick {
    fn new(len: usize) -> Self {
        Self {
            tree: vec![0; len + 1],
        }
    }

    fn add(&mut self, index: usize, delta: i64) {
        let mut i = index + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    /// Sum of buckets `0..=index`.
    fn prefix_sum(&self, index: usize) -> i64 {
        let mut sum = 0;
        let mut i = index + 1;
        while i > 0 {
            sum += self.tree[i];
            i -= i & i.wrapping_neg();
        }
        sum
    }
}

/// Equi-width histogram over a closed integer interval, used for
/// selectivity estimation.
///
/// The interval `[min, max]` is split into integer-aligned buckets of
/// as-equal-as-possible size. Counts live in a Fenwick tree so range
/// sums stay O(log buckets); bucket lookup goes through a sorted map
/// of bucket start values.
pub struct IntHistogram {
    min: i32,
    max: i32,

    starts: Vec<i32>,
    sizes: Vec<i32>,
    start_index: BTreeMap<i32, usize>,

    counts: Fenwick,
    total: i64,
}

impl IntHistogram {
    pub fn new(buckets: usize, min: i32, max: i32) -> Self {
        assert!(min <= max);
        assert!(buckets > 0);

        let width = (max as i64 - min as i64 + 1) as usize;
        let bucket_count = buckets.min(width);

        let base = width / bucket_count;
        let remainder = width % bucket_count;

        let mut starts = Vec::with_capacity(bucket_count);
        let mut sizes = Vec::with_capacity(bucket_count);
        let mut start_index = BTreeMap::new();

        let mut cursor = min as i64;
        for i in 0..bucket_count {
            let size = if i < remainder { base + 1 } else { base };
            starts.push(cursor as i32);
            sizes.push(size as i32);
            start_index.insert(cursor as i32, i);
            cursor += size as i64;
        }

        Self {
            min,
            max,
            starts,
            sizes,
            start_index,
            counts: Fenwick::new(bucket_count),
            total: 0,
        }
    }

    pub fn add_value(&mut self, v: i32) {
        let v = v.max(self.min).min(self.max);
        let bucket = self.bucket_of(v);
        self.counts.add(bucket, 1);
        self.total += 1;
    }

    /// Floor lookup: the bucket whose start is the greatest one not
    /// exceeding `v`.
    fn bucket_of(&self, v: i32) -> usize {
        *self
            .start_index
            .range(..=v)
            .next_back()
            .map(|(_, index)| index)
            .unwrap()
    }

    /// Estimated fraction of added values satisfying `value op v`.
    /// Counts integers, not real-interval measure; out-of-range
    /// constants short-circuit to 0 or 1.
    pub fn estimate_selectivity(&self, op: Op, v: i32) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        if v < self.min {
            return match op {
                Op::GreaterThan | Op::GreaterThanOrEq | Op::NotEquals => 1.0,
                _ => 0.0,
            };
        }
        if v > self.max {
            return match op {
                Op::LessThan | Op::LessThanOrEq | Op::NotEquals => 1.0,
                _ => 0.0,
            };
        }

        let bucket = self.bucket_of(v);
        let start = self.starts[bucket] as i64;
        let size = self.sizes[bucket] as i64;
        let right = start + size - 1;

        let count = self.bucket_count(bucket) as f64;
        let total = self.total as f64;

        let below = if bucket == 0 {
            0.0
        } else {
            self.counts.prefix_sum(bucket - 1) as f64
        };
        let above = self.total as f64 - self.counts.prefix_sum(bucket) as f64;

        match op {
            Op::Equals => count / size as f64 / total,
            Op::NotEquals => 1.0 - count / size as f64 / total,
            Op::GreaterThan => {
                (above + count * (right - v as i64) as f64 / size as f64) / total
            }
            Op::GreaterThanOrEq => {
                (above + count * (right - v as i64 + 1) as f64 / size as f64) / total
            }
            Op::LessThan => {
                (below + count * (v as i64 - start) as f64 / size as f64) / total
            }
            Op::LessThanOrEq => {
                (below + count * (v as i64 - start + 1) as f64 / size as f64) / total
            }
        }
    }

    fn bucket_count(&self, bucket: usize) -> i64 {
        let upto = self.counts.prefix_sum(bucket);
        let below = if bucket == 0 {
            0
        } else {
            self.counts.prefix_sum(bucket - 1)
        };
        upto - below
    }
}

// a string is coded by its first 4 bytes, each clamped to 7 bits
const STRING_CODE_CHARS: usize = 4;
const STRING_CODE_MAX: i32 = (1 << (7 * STRING_CODE_CHARS as u32)) - 1;

/// Histogram over string values: each string maps to a bounded
/// integer through a canonical prefix encoding, the rest is an
/// `IntHistogram` over the code range.
pub struct StringHistogram {
    hist: IntHistogram,
}

impl StringHistogram {
    pub fn new(buckets: usize) -> Self {
        Self {
            hist: IntHistogram::new(buckets, 0, STRING_CODE_MAX),
        }
    }

    pub fn add_value(&mut self, s: &str) {
        self.hist.add_value(Self::string_to_code(s));
    }

    pub fn estimate_selectivity(&self, op: Op, s: &str) -> f64 {
        self.hist.estimate_selectivity(op, Self::string_to_code(s))
    }

    /// Base-128 code of the (zero padded) 4-byte prefix. The coding
    /// is monotonic in the string ordering of 7-bit input.
    fn string_to_code(s: &str) -> i32 {
        let bytes = s.as_bytes();
        let mut code: i64 = 0;
        for i in 0..STRING_CODE_CHARS {
            let c = bytes.get(i).copied().unwrap_or(0).min(127) as i64;
            code = code * 128 + c;
        }
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenwick() {
        let mut f = Fenwick::new(10);
        for i in 0..10 {
            f.add(i, (i + 1) as i64);
        }
        assert_eq!(f.prefix_sum(0), 1);
        assert_eq!(f.prefix_sum(4), 15);
        assert_eq!(f.prefix_sum(9), 55);
    }

    #[test]
    fn test_uniform_estimates() {
        let mut hist = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            hist.add_value(v);
        }

        assert!((hist.estimate_selectivity(Op::GreaterThan, 50) - 0.50).abs() < 0.01);
        assert!((hist.estimate_selectivity(Op::Equals, 50) - 0.01).abs() < 1e-9);
        assert!((hist.estimate_selectivity(Op::LessThanOrEq, 50) - 0.50).abs() < 0.01);
        assert!((hist.estimate_selectivity(Op::NotEquals, 50) - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range() {
        let mut hist = IntHistogram::new(10, 1, 100);
        for v in 1..=100 {
            hist.add_value(v);
        }

        assert_eq!(hist.estimate_selectivity(Op::GreaterThan, 200), 0.0);
        assert_eq!(hist.estimate_selectivity(Op::LessThan, 0), 0.0);
        assert_eq!(hist.estimate_selectivity(Op::GreaterThan, 0), 1.0);
        assert_eq!(hist.estimate_selectivity(Op::LessThan, 200), 1.0);
        assert_eq!(hist.estimate_selectivity(Op::NotEquals, 200), 1.0);
        assert_eq!(hist.estimate_selectivity(Op::Equals, 200), 0.0);
    }

    #[test]
    fn test_uneven_buckets() {
        // 7 values over 3 buckets: sizes 3, 2, 2
        let mut hist = IntHistogram::new(3, 0, 6);
        for v in 0..=6 {
            hist.add_value(v);
        }

        let whole: f64 = (0..=6)
            .map(|v| hist.estimate_selectivity(Op::Equals, v))
            .sum();
        assert!((whole - 1.0).abs() < 1e-9);

        assert!((hist.estimate_selectivity(Op::GreaterThanOrEq, 0) - 1.0).abs() < 1e-9);
        assert!((hist.estimate_selectivity(Op::LessThanOrEq, 6) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_more_buckets_than_values() {
        let mut hist = IntHistogram::new(100, 1, 5);
        for v in 1..=5 {
            hist.add_value(v);
        }
        assert!((hist.estimate_selectivity(Op::Equals, 3) - 0.2).abs() < 1e-9);
        assert!((hist.estimate_selectivity(Op::GreaterThan, 3) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_string_histogram_orders() {
        let mut hist = StringHistogram::new(100);
        for s in &["apple", "banana", "cherry", "date", "fig"] {
            hist.add_value(s);
        }

        let low = hist.estimate_selectivity(Op::LessThan, "aaaa");
        let high = hist.estimate_selectivity(Op::LessThan, "zzzz");
        assert!(low < high);
        assert!((hist.estimate_selectivity(Op::GreaterThanOrEq, "") - 1.0).abs() < 1e-9);
    }
}
