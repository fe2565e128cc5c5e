use ndarray::{Array2, ArrayView2};

use crate::error::Result;
use crate::image::Frame;
use crate::quantize::Quantum;

impl Frame {
    /// Red channel as a `(rows, columns)` array, top row first.
    pub fn to_gray_array(&self) -> Result<Array2<Quantum>> {
        let data: Vec<Quantum> = self.pixels().iter().map(|p| p.red).collect();
        Ok(Array2::from_shape_vec((self.rows(), self.columns()), data)?)
    }

    /// Build a grayscale frame from a `(rows, columns)` array.
    pub fn from_gray_array(view: ArrayView2<'_, Quantum>, depth: u32) -> Result<Frame> {
        let (rows, columns) = view.dim();
        let values: Vec<Quantum> = view.iter().copied().collect();
        Frame::from_gray(columns, rows, depth, &values)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::image::Pixel;

    #[test]
    fn array_shape_is_rows_by_columns() {
        let frame = Frame::from_gray(3, 2, 8, &[1, 2, 3, 4, 5, 6]).unwrap();
        let arr = frame.to_gray_array().unwrap();
        assert_eq!(arr.dim(), (2, 3));
        assert_eq!(arr[[1, 0]], 4);
    }

    #[test]
    fn from_array_round_trip() {
        let arr = array![[10u16, 20], [30, 40]];
        let frame = Frame::from_gray_array(arr.view(), 16).unwrap();
        assert_eq!(frame.pixel(0, 1), Some(Pixel::gray(30)));
        assert_eq!(frame.to_gray_array().unwrap(), arr);
    }

    #[test]
    fn transposed_view_is_read_logically() {
        let arr = array![[1u16, 2], [3, 4]];
        let frame = Frame::from_gray_array(arr.t(), 8).unwrap();
        assert_eq!(frame.pixel(1, 0), Some(Pixel::gray(3)));
    }
}
