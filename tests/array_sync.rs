use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gridstore::array::codec::{GzipCompressor, ZlibCompressor};
use gridstore::array::{
    Array, ArrayBuilder, ArrayError, Compressor, DataType, Element, Endianness, FillValue,
};
use gridstore::region::Region;
use gridstore::storage::store::MemoryStore;
use gridstore::storage::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError, StoreKey,
    WritableStorageTraits,
};

/// A store wrapper counting `get` calls, for asserting that the full-chunk
/// fast path skips the pre-write read.
#[derive(Debug, Default)]
struct GetCountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
}

impl GetCountingStore {
    fn gets(&self) -> usize {
        self.gets.load(Ordering::Relaxed)
    }
}

impl ReadableStorageTraits for GetCountingStore {
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        self.inner.get(key)
    }

    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        self.inner.size_key(key)
    }
}

impl WritableStorageTraits for GetCountingStore {
    fn set(&self, key: &StoreKey, value: &[u8]) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn erase(&self, key: &StoreKey) -> Result<bool, StorageError> {
        self.inner.erase(key)
    }

    fn erase_prefix(
        &self,
        prefix: &gridstore::storage::StorePrefix,
    ) -> Result<bool, StorageError> {
        self.inner.erase_prefix(prefix)
    }
}

#[test]
fn array_1d_partial_write() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![10], vec![3], DataType::Int32, FillValue::from(-1i32))
        .create(store.clone(), "/array")?;

    array.store_region_elements::<i32>(&Region::from_ranges([4..7]), vec![7, 8, 9])?;

    let full = array.retrieve_array_elements::<i32>()?;
    assert_eq!(full, vec![-1, -1, -1, -1, 7, 8, 9, -1, -1, -1]);

    // only the two touched chunks exist
    assert_eq!(
        store.list()?,
        vec![
            StoreKey::new("array/.zarray")?,
            StoreKey::new("array/1")?,
            StoreKey::new("array/2")?,
        ]
    );
    Ok(())
}

#[test]
fn array_2d_block_write() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut builder = ArrayBuilder::new(
        vec![4, 4],
        vec![2, 2],
        DataType::Float32,
        FillValue::from(0f32),
    );
    builder.endianness(Endianness::Little);
    let array = builder.create(store.clone(), "/array")?;

    array.store_region_elements::<f32>(
        &Region::from_ranges([1..3, 1..3]),
        vec![1.0, 0.0, 0.0, 1.0],
    )?;

    let full = array.retrieve_array_elements::<f32>()?;
    #[rustfmt::skip]
    assert_eq!(
        full,
        vec![
            0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ]
    );

    // the write touches all four chunks
    for key in ["array/0.0", "array/0.1", "array/1.0", "array/1.1"] {
        assert!(store.get(&StoreKey::new(key)?)?.is_some(), "{key} missing");
    }
    Ok(())
}

#[test]
fn array_full_chunk_write_skips_decode() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(GetCountingStore::default());
    let array = ArrayBuilder::new(
        vec![5, 5],
        vec![5, 5],
        DataType::Int32,
        FillValue::from(0i32),
    )
    .create(store.clone(), "/array")?;

    let elements: Vec<i32> = (0..25).collect();
    array.store_region_elements::<i32>(&Region::whole(vec![5, 5]), elements.clone())?;

    // a single chunk was created and the write never read it back
    assert_eq!(store.gets(), 0);
    assert_eq!(
        store.inner.list()?,
        vec![StoreKey::new("array/.zarray")?, StoreKey::new("array/0.0")?]
    );

    assert_eq!(array.retrieve_array_elements::<i32>()?, elements);
    Ok(())
}

#[test]
fn array_zlib_ramp_slice() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let mut builder = ArrayBuilder::new(
        vec![1000],
        vec![100],
        DataType::Int32,
        FillValue::from(0i32),
    );
    builder.compressor(Compressor::new(ZlibCompressor::new(5)?));
    let array = builder.create(store.clone(), "/array")?;

    let ramp: Vec<i32> = (0..1000).collect();
    array.store_region_elements::<i32>(&Region::whole(vec![1000]), ramp)?;

    let slice = array.retrieve_region_elements::<i32>(&Region::from_ranges([250..750]))?;
    assert_eq!(slice, (250..750).collect::<Vec<i32>>());

    // chunk blobs are compressed
    let blob = store.get(&StoreKey::new("array/0")?)?.unwrap();
    assert!(blob.len() < 400);
    Ok(())
}

#[test]
fn array_fill_on_miss() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![6, 6],
        vec![4, 4],
        DataType::Float64,
        FillValue::from(2.5f64),
    )
    .create(store, "/array")?;

    let region = Region::from_ranges([1..5, 2..6]);
    let elements = array.retrieve_region_elements::<f64>(&region)?;
    assert_eq!(elements, vec![2.5; 16]);
    Ok(())
}

#[test]
fn array_chunk_independence() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![8, 8],
        vec![2, 2],
        DataType::UInt8,
        FillValue::from(0u8),
    )
    .create(store, "/array")?;

    // regions with disjoint chunk sets
    let region_a = Region::from_ranges([0..2, 0..4]);
    let region_b = Region::from_ranges([4..6, 4..8]);
    array.store_region_elements::<u8>(&region_a, vec![1; 8])?;
    array.store_region_elements::<u8>(&region_b, vec![2; 8])?;

    assert_eq!(
        array.retrieve_region_elements::<u8>(&region_a)?,
        vec![1; 8]
    );
    assert_eq!(
        array.retrieve_region_elements::<u8>(&region_b)?,
        vec![2; 8]
    );
    Ok(())
}

#[test]
fn array_partial_edge_chunks() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![5, 5],
        vec![3, 3],
        DataType::Int16,
        FillValue::from(-1i16),
    )
    .create(store, "/array")?;

    let elements: Vec<i16> = (0..25).collect();
    array.store_region_elements::<i16>(&Region::whole(vec![5, 5]), elements.clone())?;
    assert_eq!(array.retrieve_array_elements::<i16>()?, elements);

    // a region straddling the chunk grid edge returns in-shape cells only
    let corner = array.retrieve_region_elements::<i16>(&Region::from_ranges([3..5, 3..5]))?;
    assert_eq!(corner, vec![18, 19, 23, 24]);

    // out-of-shape regions are rejected, the padding is unreachable
    assert!(matches!(
        array.retrieve_region(&Region::from_ranges([3..6, 3..6])),
        Err(ArrayError::InvalidRegion(_, _))
    ));
    Ok(())
}

#[test]
fn array_region_validation() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![4, 4],
        vec![2, 2],
        DataType::UInt8,
        FillValue::from(0u8),
    )
    .create(store, "/array")?;

    // rank mismatch
    assert!(matches!(
        array.retrieve_region(&Region::from_ranges([0..2])),
        Err(ArrayError::InvalidRegion(_, _))
    ));
    // bounds
    assert!(matches!(
        array.store_region(&Region::from_ranges([3..5, 0..1]), vec![0, 0]),
        Err(ArrayError::InvalidRegion(_, _))
    ));
    // buffer size
    assert!(matches!(
        array.store_region(&Region::from_ranges([0..2, 0..1]), vec![0; 3]),
        Err(ArrayError::InvalidBytesInputSize(3, 2))
    ));
    // element type
    assert!(matches!(
        array.retrieve_region_elements::<u16>(&Region::from_ranges([0..1, 0..1])),
        Err(ArrayError::IncompatibleElementType(
            DataType::UInt16,
            DataType::UInt8
        ))
    ));
    // empty regions are no-ops
    assert!(array
        .store_region(&Region::from_ranges([0..0, 0..0]), vec![])
        .is_ok());
    assert_eq!(
        array.retrieve_region(&Region::from_ranges([0..0, 0..0]))?,
        Vec::<u8>::new()
    );
    Ok(())
}

#[test]
fn array_corrupt_chunk() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4], vec![2], DataType::Int32, FillValue::from(0i32))
        .create(store.clone(), "/array")?;

    store.set(&StoreKey::new("array/0")?, &[0; 3])?;
    assert!(matches!(
        array.retrieve_array(),
        Err(ArrayError::CodecError(_))
    ));
    Ok(())
}

#[test]
fn array_scalar_write() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![4, 4],
        vec![2, 2],
        DataType::Float32,
        FillValue::from(0f32),
    )
    .create(store, "/array")?;

    array.store_scalar(1f32)?;
    array.store_region_scalar(&Region::from_ranges([1..3, 1..3]), 2f32)?;

    let full = array.retrieve_array_elements::<f32>()?;
    #[rustfmt::skip]
    assert_eq!(
        full,
        vec![
            1.0, 1.0, 1.0, 1.0,
            1.0, 2.0, 2.0, 1.0,
            1.0, 2.0, 2.0, 1.0,
            1.0, 1.0, 1.0, 1.0,
        ]
    );
    Ok(())
}

#[test]
fn array_parallel_matches_serial() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![20, 20],
        vec![3, 4],
        DataType::UInt32,
        FillValue::from(0u32),
    )
    .create(store, "/array")?;

    let region = Region::from_ranges([1..19, 2..18]);
    let elements: Vec<u32> = (0..region.num_elements() as u32).collect();
    array.par_store_region_elements::<u32>(&region, elements.clone())?;

    assert_eq!(
        array.par_retrieve_region_elements::<u32>(&region)?,
        elements
    );
    assert_eq!(array.retrieve_region_elements::<u32>(&region)?, elements);
    Ok(())
}

fn round_trip<T: Element + std::fmt::Debug + PartialEq + TryFrom<usize>>(
    data_type: DataType,
    fill_value: FillValue,
    compressor: Compressor,
    endianness: Endianness,
) -> Result<(), Box<dyn std::error::Error>>
where
    <T as TryFrom<usize>>::Error: std::fmt::Debug,
{
    let store = Arc::new(MemoryStore::new());
    let mut builder = ArrayBuilder::new(vec![7], vec![3], data_type, fill_value);
    builder.endianness(endianness).compressor(compressor);
    let array = builder.create(store.clone(), "/array")?;

    let region = Region::from_ranges([1..6]);
    let elements: Vec<T> = (1..6).map(|i| T::try_from(i).unwrap()).collect();
    array.store_region_elements::<T>(&region, elements.clone())?;

    // read back through a freshly opened array
    let array = Array::open(store, "/array")?;
    assert_eq!(array.retrieve_region_elements::<T>(&region)?, elements);
    Ok(())
}

#[test]
fn array_round_trip_all_data_types() -> Result<(), Box<dyn std::error::Error>> {
    for endianness in [Endianness::Little, Endianness::Big] {
        round_trip::<i8>(
            DataType::Int8,
            FillValue::from(0i8),
            Compressor::null(),
            endianness,
        )?;
        round_trip::<i16>(
            DataType::Int16,
            FillValue::from(0i16),
            Compressor::null(),
            endianness,
        )?;
        round_trip::<i32>(
            DataType::Int32,
            FillValue::from(0i32),
            Compressor::new(ZlibCompressor::new(1)?),
            endianness,
        )?;
        round_trip::<i64>(
            DataType::Int64,
            FillValue::from(0i64),
            Compressor::new(GzipCompressor::new(1)?),
            endianness,
        )?;
        round_trip::<u8>(
            DataType::UInt8,
            FillValue::from(0u8),
            Compressor::new(ZlibCompressor::new(9)?),
            endianness,
        )?;
        round_trip::<u16>(
            DataType::UInt16,
            FillValue::from(0u16),
            Compressor::null(),
            endianness,
        )?;
        round_trip::<u32>(
            DataType::UInt32,
            FillValue::from(0u32),
            Compressor::null(),
            endianness,
        )?;
        round_trip::<u64>(
            DataType::UInt64,
            FillValue::from(0u64),
            Compressor::new(ZlibCompressor::new(5)?),
            endianness,
        )?;
    }
    Ok(())
}

#[test]
fn array_round_trip_floats() -> Result<(), Box<dyn std::error::Error>> {
    for endianness in [Endianness::Little, Endianness::Big] {
        for compressor in [
            Compressor::null(),
            Compressor::new(ZlibCompressor::new(5)?),
        ] {
            let store = Arc::new(MemoryStore::new());
            let mut builder = ArrayBuilder::new(
                vec![7],
                vec![3],
                DataType::Float32,
                FillValue::from(f32::NAN),
            );
            builder.endianness(endianness).compressor(compressor);
            let array = builder.create(store.clone(), "/array")?;

            let region = Region::from_ranges([1..6]);
            let elements: Vec<f32> = vec![-1.5, 0.0, 1.5, 3.0, 4.5];
            array.store_region_elements::<f32>(&region, elements.clone())?;

            let array = Array::open(store, "/array")?;
            assert_eq!(array.retrieve_region_elements::<f32>(&region)?, elements);
            // untouched cells read as the NaN fill value
            let head = array.retrieve_region_elements::<f32>(&Region::from_ranges([0..1]))?;
            assert!(head[0].is_nan());
        }
    }
    Ok(())
}

#[test]
fn array_open_missing_metadata() {
    let store = Arc::new(MemoryStore::new());
    assert!(Array::open(store, "/array").is_err());
}
