//! Typed leaf arrays and the numeric visitor.
//!
//! A [`DataArray`] is one of six element types over a [`Buffer`]. Buffers share
//! their storage through an `Arc`, so strided views into an existing array
//! never copy; writes through [`Buffer::set`] copy the storage first when it is
//! shared with another view.

use core::fmt;
use std::sync::Arc;

use num_traits::{Bounded, NumCast, ToPrimitive};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::data::dtype::DataType;
use crate::mesh_error::MeshError;

/// Numeric element storable in a [`DataArray`].
pub trait Element:
    Copy
    + Default
    + PartialEq
    + fmt::Debug
    + NumCast
    + ToPrimitive
    + Bounded
    + bytemuck::Pod
    + Send
    + Sync
    + 'static
{
    const DTYPE: DataType;

    /// Wrap a typed buffer into the matching [`DataArray`] variant.
    fn wrap(buf: Buffer<Self>) -> DataArray;

    /// Borrow the typed buffer if `array` holds this element type.
    fn unwrap_ref(array: &DataArray) -> Option<&Buffer<Self>>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            const DTYPE: DataType = DataType::$variant;

            fn wrap(buf: Buffer<Self>) -> DataArray {
                DataArray::$variant(buf)
            }

            fn unwrap_ref(array: &DataArray) -> Option<&Buffer<Self>> {
                match array {
                    DataArray::$variant(b) => Some(b),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(u32, UInt32);
impl_element!(u64, UInt64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);

/// Strided view over shared element storage.
#[derive(Clone)]
pub struct Buffer<T> {
    storage: Arc<[T]>,
    offset: usize,
    stride: usize,
    len: usize,
}

impl<T: Element> Buffer<T> {
    pub fn from_vec(values: Vec<T>) -> Self {
        let len = values.len();
        Self {
            storage: values.into(),
            offset: 0,
            stride: 1,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        (index < self.len).then(|| self.storage[self.offset + index * self.stride])
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.storage[self.offset + i * self.stride])
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// True when elements are adjacent in storage.
    pub fn is_contiguous(&self) -> bool {
        self.stride == 1 || self.len <= 1
    }

    /// Contiguous elements as a slice, `None` for strided views.
    pub fn as_slice(&self) -> Option<&[T]> {
        self.is_contiguous()
            .then(|| &self.storage[self.offset..self.offset + self.len])
    }

    /// Raw little-endian bytes of a contiguous buffer.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.as_slice().map(bytemuck::cast_slice)
    }

    /// Non-owning view of `len` elements starting at logical `offset`, taking
    /// every `stride`-th element. Shares storage with `self`.
    pub fn view(&self, offset: usize, stride: usize, len: usize) -> Result<Self, MeshError> {
        if stride == 0 {
            return Err(MeshError::InvalidGeometry(
                "buffer view stride must be positive".into(),
            ));
        }
        if len > 0 {
            let last = offset + (len - 1) * stride;
            if last >= self.len {
                return Err(MeshError::out_of_range("buffer view", last, self.len));
            }
        }
        Ok(Self {
            storage: Arc::clone(&self.storage),
            offset: self.offset + offset * self.stride,
            stride: self.stride * stride,
            len,
        })
    }

    /// Overwrite one element, detaching from shared storage first.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), MeshError> {
        if index >= self.len {
            return Err(MeshError::out_of_range("buffer write", index, self.len));
        }
        if Arc::get_mut(&mut self.storage).is_none() {
            self.storage = self.to_vec().into();
            self.offset = 0;
            self.stride = 1;
        }
        let pos = self.offset + index * self.stride;
        if let Some(data) = Arc::get_mut(&mut self.storage) {
            data[pos] = value;
        }
        Ok(())
    }

    /// True when both buffers read from the same allocation.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}

impl<T: Element> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Element> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Element> From<Vec<T>> for Buffer<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_vec(values)
    }
}

impl<T: Element + Serialize> Serialize for Buffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len))?;
        for v in self.iter() {
            seq.serialize_element(&v)?;
        }
        seq.end()
    }
}

impl<'de, T: Element + Deserialize<'de>> Deserialize<'de> for Buffer<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Buffer::from_vec)
    }
}

/// Homogeneously typed numeric leaf.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
pub enum DataArray {
    Int32(Buffer<i32>),
    Int64(Buffer<i64>),
    UInt32(Buffer<u32>),
    UInt64(Buffer<u64>),
    Float32(Buffer<f32>),
    Float64(Buffer<f64>),
}

/// Operation generic over the element type of a [`DataArray`].
///
/// [`DataArray::visit`] matches the variant once and hands the typed buffer
/// to `visit`, so inner loops run monomorphized.
pub trait ArrayVisitor {
    type Output;
    fn visit<T: Element>(self, buf: &Buffer<T>) -> Self::Output;
}

impl DataArray {
    pub fn dtype(&self) -> DataType {
        match self {
            DataArray::Int32(_) => DataType::Int32,
            DataArray::Int64(_) => DataType::Int64,
            DataArray::UInt32(_) => DataType::UInt32,
            DataArray::UInt64(_) => DataType::UInt64,
            DataArray::Float32(_) => DataType::Float32,
            DataArray::Float64(_) => DataType::Float64,
        }
    }

    pub fn visit<V: ArrayVisitor>(&self, visitor: V) -> V::Output {
        match self {
            DataArray::Int32(b) => visitor.visit(b),
            DataArray::Int64(b) => visitor.visit(b),
            DataArray::UInt32(b) => visitor.visit(b),
            DataArray::UInt64(b) => visitor.visit(b),
            DataArray::Float32(b) => visitor.visit(b),
            DataArray::Float64(b) => visitor.visit(b),
        }
    }

    pub fn len(&self) -> usize {
        struct Len;
        impl ArrayVisitor for Len {
            type Output = usize;
            fn visit<T: Element>(self, buf: &Buffer<T>) -> usize {
                buf.len()
            }
        }
        self.visit(Len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `len` zero elements of `dtype`.
    pub fn zeros(dtype: DataType, len: usize) -> Self {
        fn make<T: Element>(len: usize) -> DataArray {
            T::wrap(Buffer::from_vec(vec![T::default(); len]))
        }
        match dtype {
            DataType::Int32 => make::<i32>(len),
            DataType::Int64 => make::<i64>(len),
            DataType::UInt32 => make::<u32>(len),
            DataType::UInt64 => make::<u64>(len),
            DataType::Float32 => make::<f32>(len),
            DataType::Float64 => make::<f64>(len),
        }
    }

    /// Ingest raw little-endian memory as an owned array of `dtype`.
    pub fn from_le_bytes(dtype: DataType, bytes: &[u8]) -> Result<Self, MeshError> {
        fn read<T: Element>(bytes: &[u8]) -> Result<DataArray, MeshError> {
            let width = T::DTYPE.byte_size();
            if bytes.len() % width != 0 {
                return Err(MeshError::InvalidGeometry(format!(
                    "{} bytes is not a multiple of the {} element size",
                    bytes.len(),
                    T::DTYPE
                )));
            }
            let values = bytes
                .chunks_exact(width)
                .map(|chunk| {
                    let mut v: T = bytemuck::Zeroable::zeroed();
                    bytemuck::bytes_of_mut(&mut v).copy_from_slice(chunk);
                    if cfg!(target_endian = "big") {
                        bytemuck::bytes_of_mut(&mut v).reverse();
                    }
                    v
                })
                .collect();
            Ok(T::wrap(Buffer::from_vec(values)))
        }
        match dtype {
            DataType::Int32 => read::<i32>(bytes),
            DataType::Int64 => read::<i64>(bytes),
            DataType::UInt32 => read::<u32>(bytes),
            DataType::UInt64 => read::<u64>(bytes),
            DataType::Float32 => read::<f32>(bytes),
            DataType::Float64 => read::<f64>(bytes),
        }
    }

    /// Build an array of `dtype` from arbitrary primitive values.
    ///
    /// Values are cast with `NumCast`; a value outside the target range fails
    /// with [`MeshError::LossyConversion`]. Floats narrowed to `float32` round.
    pub fn from_values<S>(dtype: DataType, values: &[S]) -> Result<Self, MeshError>
    where
        S: ToPrimitive + Copy + fmt::Debug,
    {
        fn cast<S: ToPrimitive + Copy + fmt::Debug, D: Element>(
            values: &[S],
        ) -> Result<DataArray, MeshError> {
            values
                .iter()
                .map(|&v| <D as NumCast>::from(v).ok_or_else(|| lossy(v, D::DTYPE)))
                .collect::<Result<Vec<D>, _>>()
                .map(|v| D::wrap(Buffer::from_vec(v)))
        }
        match dtype {
            DataType::Int32 => cast::<S, i32>(values),
            DataType::Int64 => cast::<S, i64>(values),
            DataType::UInt32 => cast::<S, u32>(values),
            DataType::UInt64 => cast::<S, u64>(values),
            DataType::Float32 => cast::<S, f32>(values),
            DataType::Float64 => cast::<S, f64>(values),
        }
    }

    /// Typed buffer access; `None` when the element type differs.
    pub fn as_buffer<T: Element>(&self) -> Option<&Buffer<T>> {
        T::unwrap_ref(self)
    }

    /// Convert to `dtype`, failing if any value does not survive the round trip.
    pub fn convert(&self, dtype: DataType) -> Result<Self, MeshError> {
        if dtype == self.dtype() {
            return Ok(self.clone());
        }
        self.visit(Convert { target: dtype })
    }

    /// Non-owning strided view sharing this array's storage.
    pub fn view(&self, offset: usize, stride: usize, len: usize) -> Result<Self, MeshError> {
        struct View(usize, usize, usize);
        impl ArrayVisitor for View {
            type Output = Result<DataArray, MeshError>;
            fn visit<T: Element>(self, buf: &Buffer<T>) -> Self::Output {
                buf.view(self.0, self.1, self.2).map(T::wrap)
            }
        }
        self.visit(View(offset, stride, len))
    }

    /// Read an integer array as indices.
    pub fn to_indices(&self) -> Result<Vec<usize>, MeshError> {
        struct Indices;
        impl ArrayVisitor for Indices {
            type Output = Result<Vec<usize>, MeshError>;
            fn visit<T: Element>(self, buf: &Buffer<T>) -> Self::Output {
                if T::DTYPE.is_float() {
                    return Err(MeshError::UnsupportedType {
                        context: "index array".into(),
                        dtype: T::DTYPE.name().into(),
                    });
                }
                buf.iter()
                    .map(|v| {
                        v.to_usize().ok_or_else(|| MeshError::IndexOutOfRange {
                            context: "index array".into(),
                            index: v.to_i64().unwrap_or(i64::MIN),
                            len: buf.len(),
                        })
                    })
                    .collect()
            }
        }
        self.visit(Indices)
    }

    /// All values widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        struct Floats;
        impl ArrayVisitor for Floats {
            type Output = Vec<f64>;
            fn visit<T: Element>(self, buf: &Buffer<T>) -> Vec<f64> {
                buf.iter().map(|v| v.to_f64().unwrap_or(f64::NAN)).collect()
            }
        }
        self.visit(Floats)
    }

    /// All values as `i64`; unsigned values beyond `i64::MAX` and floats with a
    /// fractional part fail.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>, MeshError> {
        match self.convert(DataType::Int64)? {
            DataArray::Int64(b) => Ok(b.to_vec()),
            other => Err(MeshError::UnsupportedType {
                context: "int64 read".into(),
                dtype: other.dtype().name().into(),
            }),
        }
    }

    pub fn get_f64(&self, index: usize) -> Option<f64> {
        struct At(usize);
        impl ArrayVisitor for At {
            type Output = Option<f64>;
            fn visit<T: Element>(self, buf: &Buffer<T>) -> Option<f64> {
                buf.get(self.0).and_then(|v| v.to_f64())
            }
        }
        self.visit(At(index))
    }

    /// New array of the same type holding `self[indices[i]]`.
    pub fn gather(&self, indices: &[usize]) -> Result<Self, MeshError> {
        struct Gather<'a>(&'a [usize]);
        impl ArrayVisitor for Gather<'_> {
            type Output = Result<DataArray, MeshError>;
            fn visit<T: Element>(self, buf: &Buffer<T>) -> Self::Output {
                self.0
                    .iter()
                    .map(|&i| {
                        buf.get(i)
                            .ok_or_else(|| MeshError::out_of_range("gather", i, buf.len()))
                    })
                    .collect::<Result<Vec<T>, _>>()
                    .map(|v| T::wrap(Buffer::from_vec(v)))
            }
        }
        self.visit(Gather(indices))
    }
}

struct Convert {
    target: DataType,
}

impl ArrayVisitor for Convert {
    type Output = Result<DataArray, MeshError>;

    fn visit<T: Element>(self, buf: &Buffer<T>) -> Self::Output {
        match self.target {
            DataType::Int32 => checked_cast::<T, i32>(buf),
            DataType::Int64 => checked_cast::<T, i64>(buf),
            DataType::UInt32 => checked_cast::<T, u32>(buf),
            DataType::UInt64 => checked_cast::<T, u64>(buf),
            DataType::Float32 => checked_cast::<T, f32>(buf),
            DataType::Float64 => checked_cast::<T, f64>(buf),
        }
    }
}

fn checked_cast<S: Element, D: Element>(buf: &Buffer<S>) -> Result<DataArray, MeshError> {
    let mut out = Vec::with_capacity(buf.len());
    for v in buf.iter() {
        let nan = v.to_f64().is_some_and(f64::is_nan);
        let d = <D as NumCast>::from(v).ok_or_else(|| lossy(v, D::DTYPE))?;
        let back = <S as NumCast>::from(d);
        if !(back == Some(v) || (nan && D::DTYPE.is_float())) {
            return Err(lossy(v, D::DTYPE));
        }
        out.push(d);
    }
    Ok(D::wrap(Buffer::from_vec(out)))
}

fn lossy<V: fmt::Debug>(value: V, dtype: DataType) -> MeshError {
    MeshError::LossyConversion {
        value: format!("{value:?}"),
        dtype: dtype.name(),
    }
}

impl<T: Element> From<Vec<T>> for DataArray {
    fn from(values: Vec<T>) -> Self {
        T::wrap(Buffer::from_vec(values))
    }
}

impl<T: Element> From<Buffer<T>> for DataArray {
    fn from(buf: Buffer<T>) -> Self {
        T::wrap(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strided_view_shares_storage() {
        let base = Buffer::from_vec(vec![0i64, 1, 2, 3, 4, 5]);
        let odd = base.view(1, 2, 3).unwrap();
        assert_eq!(odd.to_vec(), vec![1, 3, 5]);
        assert!(odd.shares_storage_with(&base));
        assert!(odd.as_slice().is_none());
        assert!(base.view(1, 2, 4).is_err());
    }

    #[test]
    fn set_on_shared_view_copies() {
        let base = Buffer::from_vec(vec![1.0f64, 2.0, 3.0]);
        let mut v = base.view(0, 1, 3).unwrap();
        v.set(1, 9.0).unwrap();
        assert_eq!(base.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(v.to_vec(), vec![1.0, 9.0, 3.0]);
        assert!(!v.shares_storage_with(&base));
        assert!(v.set(3, 0.0).is_err());
    }

    #[test]
    fn little_endian_bytes_round_trip() {
        let a = DataArray::from(vec![1u32, 256, 70000]);
        let bytes = match &a {
            DataArray::UInt32(b) => b.as_bytes().unwrap().to_vec(),
            _ => unreachable!(),
        };
        let b = DataArray::from_le_bytes(DataType::UInt32, &bytes).unwrap();
        assert_eq!(a, b);
        assert!(DataArray::from_le_bytes(DataType::Int64, &bytes[..5]).is_err());
    }

    #[test]
    fn convert_checks_losslessness() {
        let a = DataArray::from(vec![1i64, -2, 3]);
        assert_eq!(a.convert(DataType::Int32).unwrap().dtype(), DataType::Int32);
        assert!(matches!(
            a.convert(DataType::UInt32),
            Err(MeshError::LossyConversion { .. })
        ));
        let f = DataArray::from(vec![1.5f64]);
        assert!(f.convert(DataType::Int64).is_err());
        let whole = DataArray::from(vec![2.0f64]);
        assert_eq!(whole.to_i64_vec().unwrap(), vec![2]);
    }

    #[test]
    fn indices_reject_negative_and_float() {
        assert_eq!(
            DataArray::from(vec![0i32, 4, 2]).to_indices().unwrap(),
            vec![0, 4, 2]
        );
        assert!(matches!(
            DataArray::from(vec![0i32, -1]).to_indices(),
            Err(MeshError::IndexOutOfRange { index: -1, .. })
        ));
        assert!(matches!(
            DataArray::from(vec![0.0f32]).to_indices(),
            Err(MeshError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn gather_keeps_type() {
        let a = DataArray::from(vec![10u64, 20, 30]);
        let g = a.gather(&[2, 2, 0]).unwrap();
        assert_eq!(g, DataArray::from(vec![30u64, 30, 10]));
        assert!(a.gather(&[3]).is_err());
    }
}
