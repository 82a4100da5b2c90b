/// Dense 2D buffer stored row-major, `height` rows of `width` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Field<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Copy> Field<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> anyhow::Result<Self> {
        if data.len() != width * height {
            anyhow::bail!(
                "field data has {} elements, expected {}x{} = {}",
                data.len(),
                height,
                width,
                width * height
            );
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_fn<F: FnMut(usize, usize) -> T>(width: usize, height: usize, mut func: F) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(func(y, x));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(rows, columns)`, the same order as the logical output shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn get(&self, y: usize, x: usize) -> T {
        self.data[self.index_of(y, x)]
    }

    pub fn set(&mut self, y: usize, x: usize, value: T) {
        let index = self.index_of(y, x);
        self.data[index] = value;
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Copy of this field with a `border`-wide frame on every side, filled by
    /// replicating the nearest edge sample.
    pub fn padded(&self, border: usize) -> Self {
        let width = self.width + 2 * border;
        let height = self.height + 2 * border;
        if self.data.is_empty() {
            // nothing to replicate from, an empty field stays empty
            return Self {
                width: self.width,
                height: self.height,
                data: vec![],
            };
        }
        Self::from_fn(width, height, |y, x| {
            let sy = y.saturating_sub(border).min(self.height - 1);
            let sx = x.saturating_sub(border).min(self.width - 1);
            self.get(sy, sx)
        })
    }

    #[inline]
    fn index_of(&self, y: usize, x: usize) -> usize {
        debug_assert!(y < self.height && x < self.width);
        y * self.width + x
    }
}
