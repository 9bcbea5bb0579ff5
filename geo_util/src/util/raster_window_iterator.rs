use crate::util::ChunkPairIterator;

/// Walks a raster in square blocks of `block_size` pixels, row of blocks by row of blocks.
/// Blocks on the right and bottom edges are truncated to the raster.
pub struct RasterBlockIterator
{
    num_steps: usize,

    x_pair_it: ChunkPairIterator,
    y_pair_it: ChunkPairIterator,
    num_col_blocks: usize,
    cur_step: usize,

    current_y_pair: Option< (usize, usize) >
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterBlock
{
    //X, Y  or column, row order
    pub window_size: (usize, usize),

    pub window_offset: (usize, usize),

    pub x_range_inclusive: (usize, usize),
    pub y_range_inclusive: (usize, usize),

    pub current_step: usize,
    pub num_steps: usize
}

impl RasterBlockIterator
{
    pub fn new(n_rows: usize, n_cols: usize, block_size: usize) -> Self {

        assert!(n_rows > 0);
        assert!(n_cols > 0);
        assert!(block_size > 0);

        let y_it = ChunkPairIterator::new(0, n_rows - 1, block_size);
        let x_it = ChunkPairIterator::new(0, n_cols - 1, block_size);
        let x_it_len = x_it.len();

        Self {
            num_steps: y_it.len() * x_it_len,

            x_pair_it: x_it,
            y_pair_it: y_it,
            num_col_blocks: x_it_len,

            cur_step: 0,

            current_y_pair: None
        }
    }
}

impl Iterator for RasterBlockIterator
{
    type Item = RasterBlock;

    fn next(&mut self) -> Option<Self::Item> {

        if self.cur_step >= self.num_steps {
            return None;
        }

        let block_col = self.cur_step % self.num_col_blocks;

        if block_col == 0 {
            self.current_y_pair = self.y_pair_it.next()
        }

        let y_val = self.current_y_pair?;
        let x_val = self.x_pair_it.next()?;

        if block_col == self.num_col_blocks - 1 {
            self.x_pair_it.reset();
        }

        let block = RasterBlock {
            window_size: (1 + x_val.1 - x_val.0, 1 + y_val.1 - y_val.0),
            window_offset: (x_val.0, y_val.0),
            x_range_inclusive: x_val,
            y_range_inclusive: y_val,
            current_step: self.cur_step,
            num_steps: self.num_steps
        };

        self.cur_step += 1;

        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let l = self.num_steps - self.cur_step;
        (l, Some(l))
    }
}

impl ExactSizeIterator for RasterBlockIterator
{

}

#[cfg(test)]
mod raster_window_iterator_tests {
    use super::*;

    #[test]
    fn test_block_iter_4blocks() {
        let mut it = RasterBlockIterator::new(5, 5, 3);
        assert_eq!(4, it.len());

        let item = it.next().unwrap();

        assert_eq!( (3,3), item.window_size);
        assert_eq!( (0,0), item.window_offset);

        let item = it.next().unwrap();

        assert_eq!( (2,3), item.window_size);
        assert_eq!( (3,0), item.window_offset);

        let item = it.next().unwrap();

        assert_eq!( (3,2), item.window_size);
        assert_eq!( (0,3), item.window_offset);

        let item = it.next().unwrap();

        assert_eq!( (2,2), item.window_size);
        assert_eq!( (3,3), item.window_offset);
        assert_eq!( 3, item.current_step);

        assert!(it.next().is_none());
    }

    #[test]
    fn test_block_bigger_than_raster() {
        let mut it = RasterBlockIterator::new(52, 15, 64);
        assert_eq!(1, it.len());

        let item = it.next().unwrap();

        assert_eq!( (15,52), item.window_size);
        assert_eq!( (0,0), item.window_offset);

        assert!(it.next().is_none());
    }

    #[test]
    fn test_blocks_cover_every_pixel_once() {
        let (n_rows, n_cols) = (103, 112);
        let mut seen = vec![0u8; n_rows * n_cols];

        let it = RasterBlockIterator::new(n_rows, n_cols, 16);
        assert_eq!(7 * 7, it.len());

        for block in it {
            for r in block.y_range_inclusive.0..=block.y_range_inclusive.1 {
                for c in block.x_range_inclusive.0..=block.x_range_inclusive.1 {
                    seen[r * n_cols + c] += 1;
                }
            }
        }

        assert!(seen.iter().all(|s| *s == 1));
    }
}
