// Splits an inclusive index range into consecutive inclusive sub ranges.
// See the tests for examples

#[derive(Debug, Clone)]
pub struct ChunkPairIterator
{
    start: usize,
    end: usize,
    step_size: usize,
    num_steps: usize,
    cur_step: usize,
}

impl ChunkPairIterator
{
    ///
    /// Start and end are inclusive
    pub fn new(start: usize, end: usize, step_size: usize) -> Self {

        assert!(end >= start);
        assert!(step_size >= 1);

        let range_len = 1 + end - start;

        ChunkPairIterator {
            start,
            end,
            step_size,
            num_steps: range_len.div_ceil(step_size),
            cur_step: 0,
        }
    }

    pub fn reset(&mut self) {
        self.cur_step = 0;
    }
}

impl Iterator for ChunkPairIterator
{
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {

        if self.cur_step >= self.num_steps {
            return None;
        }

        let lower_bound_inc = self.start + self.cur_step * self.step_size;
        let upper_bound_inc = (lower_bound_inc + self.step_size - 1).min(self.end);

        self.cur_step += 1;

        Some( (lower_bound_inc, upper_bound_inc) )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let l = self.num_steps - self.cur_step;
        (l, Some(l))
    }
}

impl ExactSizeIterator for ChunkPairIterator
{

}

#[cfg(test)]
mod chunk_iterator_tests {

    use super::*;

    #[test]
    fn test_pair_chunk_iter() {
        let v : Vec<_> = ChunkPairIterator::new(0, 10, 3).collect();
        assert_eq!(v, vec![(0, 2), (3, 5), (6, 8), (9, 10)]);

        let v : Vec<_> = ChunkPairIterator::new(2, 11, 3).collect();
        assert_eq!(v, vec![(2, 4), (5, 7), (8, 10), (11, 11)]);

        let v : Vec<_> = ChunkPairIterator::new(2, 10, 3).collect();
        assert_eq!(v, vec![(2, 4), (5, 7), (8, 10)]);

        let v : Vec<_> = ChunkPairIterator::new(3, 5, 30).collect();
        assert_eq!(v, vec![(3, 5)]);

        let v : Vec<_> = ChunkPairIterator::new(3, 5, 1).collect();
        assert_eq!(v, vec![(3, 3), (4, 4), (5, 5)]);

        let v : Vec<_> = ChunkPairIterator::new(4, 4, 30).collect();
        assert_eq!(v, vec![(4, 4)]);

        let v : Vec<_> = ChunkPairIterator::new(0, 54, 10).collect();
        assert_eq!(v, vec![(0, 9), (10, 19), (20, 29), (30, 39), (40, 49), (50, 54)]);
    }

    #[test]
    fn test_pair_chunk_iter_size() {
        for (start, stop, step_size) in [
            (0,10,3),
            (2,11,3),
            (4,5,30),
            (4,4,1),
            (0, 54,10),
        ] {
            let mut it = ChunkPairIterator::new(start,stop, step_size);
            let len = it.len();

            for i in 0..len {
                assert_eq!(len - i, it.size_hint().0);
                it.next();
            }

            assert_eq!(None, it.next());

            it.reset();
            assert_eq!(len, it.len());
        }
    }
}
