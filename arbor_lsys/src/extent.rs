// Spatial extent of primitives along the growth axis.
//
// The grammar knows nothing about meshes, so how far one segment pushes the
// next one up its branch has to come from the consumer. An `ExtentSource`
// answers that per primitive with the bounds of the primitive's model along
// the growth axis: where the model starts (`min_y`, usually <= 0 for models
// centred on their origin) and how tall it is.
//
// `NoExtent` is what the extent-free parser uses: every segment is zero
// height, so every offset in the resulting tree stays 0.

use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SegmentExtent {
    /// Lowest point of the model along the growth axis, in model units.
    pub min_y: f32,
    /// Model height along the growth axis; advances the running offset.
    pub height: f32,
}

impl SegmentExtent {
    pub const ZERO: Self = Self {
        min_y: 0.0,
        height: 0.0,
    };

    pub fn new(min_y: f32, height: f32) -> Self {
        Self { min_y, height }
    }

    /// A model that starts at its origin and extends `height` upward.
    pub fn from_base(height: f32) -> Self {
        Self { min_y: 0.0, height }
    }

    /// A model centred on its origin.
    pub fn centred(height: f32) -> Self {
        Self {
            min_y: -height / 2.0,
            height,
        }
    }
}

/// Per-primitive bounds along the growth axis. The parser treats a negative
/// or NaN `height` as zero.
pub trait ExtentSource {
    fn extent(&self, primitive: char) -> SegmentExtent;
}

/// Every primitive is a point.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExtent;

impl ExtentSource for NoExtent {
    fn extent(&self, _primitive: char) -> SegmentExtent {
        SegmentExtent::ZERO
    }
}

/// Lookup by symbol; missing symbols are zero-sized.
impl ExtentSource for BTreeMap<char, SegmentExtent> {
    fn extent(&self, primitive: char) -> SegmentExtent {
        self.get(&primitive).copied().unwrap_or(SegmentExtent::ZERO)
    }
}

/// Adapts a closure into an `ExtentSource`.
pub struct ExtentFn<F>(pub F);

impl<F: Fn(char) -> SegmentExtent> ExtentSource for ExtentFn<F> {
    fn extent(&self, primitive: char) -> SegmentExtent {
        (self.0)(primitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_defaults_missing_symbols_to_zero() {
        let mut map = BTreeMap::new();
        map.insert('F', SegmentExtent::centred(2.0));
        assert_eq!(map.extent('F'), SegmentExtent::new(-1.0, 2.0));
        assert_eq!(map.extent('L'), SegmentExtent::ZERO);
    }

    #[test]
    fn closure_adapter_forwards() {
        let src = ExtentFn(|c: char| {
            if c == 'F' {
                SegmentExtent::from_base(3.0)
            } else {
                SegmentExtent::ZERO
            }
        });
        assert_eq!(src.extent('F').height, 3.0);
        assert_eq!(src.extent('X'), SegmentExtent::ZERO);
        assert_eq!(NoExtent.extent('F'), SegmentExtent::ZERO);
    }
}
