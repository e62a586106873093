/// Percentage reported after `completed` of `total` chunks succeeded.
///
/// Rounds up so the first report is never 0 for a job that has made
/// progress, but stays at 99 until the last chunk is acknowledged: 100 is
/// reserved for a fully uploaded job.
pub fn progress_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    if completed >= total {
        return 100;
    }
    let pct = (u64::from(completed) * 100).div_ceil(u64::from(total));
    pct.min(99) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_chunks() {
        let seq: Vec<u8> = (1..=3).map(|k| progress_percent(k, 3)).collect();
        assert_eq!(seq, vec![34, 67, 100]);
    }

    #[test]
    fn single_chunk_is_immediately_complete() {
        assert_eq!(progress_percent(1, 1), 100);
    }

    #[test]
    fn nothing_done() {
        assert_eq!(progress_percent(0, 4), 0);
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[test]
    fn many_chunks_never_hit_100_early() {
        let total = 1000;
        assert_eq!(progress_percent(999, total), 99);
        assert_eq!(progress_percent(1, total), 1);
        assert_eq!(progress_percent(total, total), 100);
    }

    #[test]
    fn monotonic_for_every_total() {
        for total in 1..=257u32 {
            let mut last = 0u8;
            for k in 1..=total {
                let pct = progress_percent(k, total);
                assert!(pct >= last, "total {total}: {last} -> {pct} at chunk {k}");
                assert_eq!(pct == 100, k == total, "total {total}, chunk {k}");
                last = pct;
            }
        }
    }
}
