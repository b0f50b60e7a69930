use std::sync::Arc;

use arrow_array::{Array, ListArray};
use arrow_buffer::OffsetBuffer;
use arrow_schema::{DataType, Field};

use crate::array::util::{to_offset, validated_offsets, OffsetBufferUtils};
use crate::array::CoordBuffer;
use crate::error::{GeoUnionError, Result};

/// An immutable array of Polygon/MultiPolygon geometries: three offset
/// levels, geometry → part → ring → coordinate. A geometry spanning more than
/// one part is a MultiPolygon; within a part, ring 0 is the exterior and the
/// remaining rings are holes.
#[derive(Debug, Clone)]
pub struct PolygonArray {
    pub(crate) coords: CoordBuffer,

    /// Offsets into the part array where each geometry starts
    pub(crate) geom_offsets: OffsetBuffer<i32>,

    /// Offsets into the ring array where each part starts
    pub(crate) part_offsets: OffsetBuffer<i32>,

    /// Offsets into the coordinate array where each ring starts
    pub(crate) ring_offsets: OffsetBuffer<i32>,
}

impl PolygonArray {
    /// Create a new PolygonArray from parts.
    ///
    /// # Errors
    ///
    /// - if the ring offsets are inconsistent with the coordinate count
    /// - if the part offsets are inconsistent with the ring count
    /// - if the geometry offsets are inconsistent with the part count
    pub fn try_new(
        coords: CoordBuffer,
        ring_offsets: Vec<i32>,
        part_offsets: Vec<i32>,
        geom_offsets: Vec<i32>,
    ) -> Result<Self> {
        let ring_offsets = validated_offsets(ring_offsets, coords.len(), "ring")?;
        let part_offsets = validated_offsets(part_offsets, ring_offsets.len_proxy(), "part")?;
        let geom_offsets = validated_offsets(geom_offsets, part_offsets.len_proxy(), "geometry")?;
        Ok(Self {
            coords,
            geom_offsets,
            part_offsets,
            ring_offsets,
        })
    }

    /// An array holding zero polygons.
    pub fn empty() -> Self {
        Self::try_new(
            CoordBuffer::try_new(Vec::<f64>::new().into()).unwrap(),
            vec![0],
            vec![0],
            vec![0],
        )
        .unwrap()
    }

    /// The number of geometries in this array.
    #[inline]
    pub fn len(&self) -> usize {
        self.geom_offsets.len_proxy()
    }

    /// Whether this array holds zero geometries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Access the underlying coordinate buffer.
    pub fn coords(&self) -> &CoordBuffer {
        &self.coords
    }

    /// Access the underlying geometry offsets buffer.
    pub fn geom_offsets(&self) -> &OffsetBuffer<i32> {
        &self.geom_offsets
    }

    /// Access the underlying part offsets buffer.
    pub fn part_offsets(&self) -> &OffsetBuffer<i32> {
        &self.part_offsets
    }

    /// Access the underlying ring offsets buffer.
    pub fn ring_offsets(&self) -> &OffsetBuffer<i32> {
        &self.ring_offsets
    }

    fn ring(&self, r: usize) -> geo::LineString {
        let (start, end) = self.ring_offsets.start_end(r);
        geo::LineString::new((start..end).map(|c| self.coords.value(c)).collect())
    }

    fn part(&self, p: usize) -> geo::Polygon {
        let (start, end) = self.part_offsets.start_end(p);
        let mut rings = (start..end).map(|r| self.ring(r));
        let exterior = rings.next().unwrap_or_else(|| geo::LineString::new(vec![]));
        geo::Polygon::new(exterior, rings.collect())
    }

    /// The geometry at position `i`: a `Polygon` when it spans exactly one
    /// part, otherwise a `MultiPolygon` of its parts.
    ///
    /// # Panics
    ///
    /// Panics iff `i >= self.len()`.
    pub fn value(&self, i: usize) -> geo::Geometry {
        let (start, end) = self.geom_offsets.start_end(i);
        if end - start == 1 {
            geo::Geometry::Polygon(self.part(start))
        } else {
            geo::Geometry::MultiPolygon(geo::MultiPolygon::new(
                (start..end).map(|p| self.part(p)).collect(),
            ))
        }
    }

    /// Gather the geometries at `indices` into a new array.
    ///
    /// # Panics
    ///
    /// Panics iff any index is out of bounds.
    pub fn take(&self, indices: &[usize]) -> Self {
        let mut interleaved = Vec::new();
        let mut ring_offsets = vec![0i32];
        let mut part_offsets = vec![0i32];
        let mut geom_offsets = Vec::with_capacity(indices.len() + 1);
        geom_offsets.push(0);
        for &i in indices {
            let (part_start, part_end) = self.geom_offsets.start_end(i);
            for p in part_start..part_end {
                let (ring_start, ring_end) = self.part_offsets.start_end(p);
                for r in ring_start..ring_end {
                    let (start, end) = self.ring_offsets.start_end(r);
                    self.coords.extend_range(start..end, &mut interleaved);
                    ring_offsets.push(ring_offsets.last().unwrap() + (end - start) as i32);
                }
                part_offsets.push(part_offsets.last().unwrap() + (ring_end - ring_start) as i32);
            }
            geom_offsets.push(geom_offsets.last().unwrap() + (part_end - part_start) as i32);
        }
        Self::try_new(
            CoordBuffer::try_new(interleaved.into()).unwrap(),
            ring_offsets,
            part_offsets,
            geom_offsets,
        )
        .unwrap()
    }

    /// Append `other`'s geometries after this array's.
    pub fn append(&self, other: &Self) -> Result<Self> {
        let mut interleaved = self.coords.values().to_vec();
        interleaved.extend_from_slice(other.coords.values());

        let coord_shift = to_offset(self.coords.len())?;
        let mut ring_offsets: Vec<i32> = self.ring_offsets.as_ref().to_vec();
        ring_offsets.extend(
            other.ring_offsets.as_ref()[1..]
                .iter()
                .map(|o| o + coord_shift),
        );

        let ring_shift = to_offset(self.ring_offsets.len_proxy())?;
        let mut part_offsets: Vec<i32> = self.part_offsets.as_ref().to_vec();
        part_offsets.extend(
            other.part_offsets.as_ref()[1..]
                .iter()
                .map(|o| o + ring_shift),
        );

        let part_shift = to_offset(self.part_offsets.len_proxy())?;
        let mut geom_offsets: Vec<i32> = self.geom_offsets.as_ref().to_vec();
        geom_offsets.extend(
            other.geom_offsets.as_ref()[1..]
                .iter()
                .map(|o| o + part_shift),
        );

        Self::try_new(
            CoordBuffer::try_new(interleaved.into()).unwrap(),
            ring_offsets,
            part_offsets,
            geom_offsets,
        )
    }

    /// The number of leaf coordinate pairs owned by each geometry: ring
    /// offsets composed through the part and geometry offsets.
    pub fn leaf_counts(&self) -> Vec<usize> {
        let parts: &[i32] = self.part_offsets.as_ref();
        let rings: &[i32] = self.ring_offsets.as_ref();
        (0..self.len())
            .map(|i| {
                let (start, end) = self.geom_offsets.start_end(i);
                (rings[parts[end] as usize] - rings[parts[start] as usize]) as usize
            })
            .collect()
    }

    pub(crate) fn parts_field() -> Arc<Field> {
        Field::new("polygons", DataType::List(Self::rings_field()), false).into()
    }

    pub(crate) fn rings_field() -> Arc<Field> {
        Field::new("rings", DataType::List(Self::vertices_field()), false).into()
    }

    pub(crate) fn vertices_field() -> Arc<Field> {
        Field::new("vertices", CoordBuffer::storage_type(), false).into()
    }

    /// The Arrow storage layout: `List<List<List<FixedSizeList<f64; 2>>>>`.
    pub(crate) fn storage_type() -> DataType {
        DataType::List(Self::parts_field())
    }

    pub(crate) fn into_arrow(self) -> ListArray {
        let rings = ListArray::new(
            Self::vertices_field(),
            self.ring_offsets,
            Arc::new(self.coords.into_arrow()),
            None,
        );
        let parts = ListArray::new(
            Self::rings_field(),
            self.part_offsets,
            Arc::new(rings),
            None,
        );
        ListArray::new(Self::parts_field(), self.geom_offsets, Arc::new(parts), None)
    }

    pub(crate) fn from_arrow(array: &dyn Array) -> Result<Self> {
        let downcast = |arr: &dyn Array, what: &str| -> Result<ListArray> {
            arr.as_any()
                .downcast_ref::<ListArray>()
                .cloned()
                .ok_or_else(|| {
                    GeoUnionError::IncompatibleConstruction(format!(
                        "expected List {what} array, got {:?}",
                        arr.data_type()
                    ))
                })
        };
        let geoms = downcast(array, "polygon")?;
        let parts = downcast(geoms.values().as_ref(), "part")?;
        let rings = downcast(parts.values().as_ref(), "ring")?;
        let coords = CoordBuffer::from_arrow(rings.values().as_ref())?;
        Self::try_new(
            coords,
            rings.offsets().as_ref().to_vec(),
            parts.offsets().as_ref().to_vec(),
            geoms.offsets().as_ref().to_vec(),
        )
    }
}

// OffsetBuffer carries no PartialEq, so compare the raw offset slices.
impl PartialEq for PolygonArray {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
            && self.geom_offsets.as_ref() == other.geom_offsets.as_ref()
            && self.part_offsets.as_ref() == other.part_offsets.as_ref()
            && self.ring_offsets.as_ref() == other.ring_offsets.as_ref()
    }
}

#[cfg(test)]
mod test {
    use geo::{line_string, polygon};

    use super::*;

    // Geometry 0: a triangle with one square hole (one part, two rings).
    // Geometry 1: a multipolygon of two triangles (two parts, one ring each).
    fn poly_array() -> PolygonArray {
        PolygonArray::try_new(
            vec![
                0., 0., 10., 0., 10., 10., 0., 0., // exterior ring
                1., 1., 2., 1., 2., 2., 1., 1., // hole
                20., 20., 21., 20., 21., 21., 20., 20., // part 0 of geometry 1
                30., 30., 31., 30., 31., 31., 30., 30., // part 1 of geometry 1
            ]
            .try_into()
            .unwrap(),
            vec![0, 4, 8, 12, 16],
            vec![0, 2, 3, 4],
            vec![0, 1, 3],
        )
        .unwrap()
    }

    #[test]
    fn polygon_with_hole() {
        let arr = poly_array();
        assert_eq!(
            arr.value(0),
            geo::Geometry::Polygon(polygon![
                exterior: [(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 0.)],
                interiors: [[(x: 1., y: 1.), (x: 2., y: 1.), (x: 2., y: 2.), (x: 1., y: 1.)]],
            ])
        );
    }

    #[test]
    fn multi_part_decodes_to_multipolygon() {
        let arr = poly_array();
        let expected = geo::MultiPolygon::new(vec![
            geo::Polygon::new(
                line_string![(x: 20., y: 20.), (x: 21., y: 20.), (x: 21., y: 21.), (x: 20., y: 20.)],
                vec![],
            ),
            geo::Polygon::new(
                line_string![(x: 30., y: 30.), (x: 31., y: 30.), (x: 31., y: 31.), (x: 30., y: 30.)],
                vec![],
            ),
        ]);
        assert_eq!(arr.value(1), geo::Geometry::MultiPolygon(expected));
    }

    #[test]
    fn leaf_counts_compose_three_levels() {
        assert_eq!(poly_array().leaf_counts(), vec![8, 8]);
    }

    #[test]
    fn take_rebases_all_levels() {
        let taken = poly_array().take(&[1, 0]);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.value(0), poly_array().value(1));
        assert_eq!(taken.value(1), poly_array().value(0));
        assert_eq!(taken.geom_offsets().as_ref(), &[0, 2, 3]);
    }

    #[test]
    fn malformed_part_offsets() {
        // Part offsets must end at the ring count.
        assert!(PolygonArray::try_new(
            vec![0., 0., 1., 0., 1., 1., 0., 0.].try_into().unwrap(),
            vec![0, 4],
            vec![0, 2],
            vec![0, 1],
        )
        .is_err());
    }

    #[test]
    fn arrow_round_trip() {
        let arr = poly_array();
        let arrow = arr.clone().into_arrow();
        assert_eq!(PolygonArray::from_arrow(&arrow).unwrap(), arr);
    }

    #[test]
    fn eq_observes_all_offset_levels() {
        let arr = poly_array();
        assert_eq!(arr, arr.clone());
        // Same coordinates and rings, different part grouping: one
        // two-part multipolygon instead of two single-part geometries.
        let regrouped = PolygonArray::try_new(
            arr.coords().clone(),
            arr.ring_offsets().as_ref().to_vec(),
            vec![0, 2, 4],
            vec![0, 1, 2],
        )
        .unwrap();
        assert_ne!(arr, regrouped);
    }
}
