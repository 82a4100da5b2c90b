/// Boolean neighborhood kernel of side `2 * radius + 1`, flattened row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    radius: usize,
    taps: Vec<bool>,
}

impl Footprint {
    pub fn new(radius: usize, taps: Vec<bool>) -> anyhow::Result<Self> {
        let side = 2 * radius + 1;
        if taps.len() != side * side {
            anyhow::bail!(
                "footprint of radius {} needs {}x{} = {} entries, got {}",
                radius,
                side,
                side,
                side * side,
                taps.len()
            );
        }
        Ok(Self { radius, taps })
    }

    /// Every offset within the Euclidean distance `radius` of the centre.
    pub fn disk(radius: usize) -> Self {
        let r = radius as i64;
        let mut taps = Vec::with_capacity((2 * radius + 1) * (2 * radius + 1));
        for dy in -r..=r {
            for dx in -r..=r {
                taps.push(dy * dy + dx * dx <= r * r);
            }
        }
        Self { radius, taps }
    }

    pub fn full(radius: usize) -> Self {
        let side = 2 * radius + 1;
        Self {
            radius,
            taps: vec![true; side * side],
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.taps
    }

    pub fn count(&self) -> usize {
        self.taps.iter().filter(|tap| **tap).count()
    }
}
