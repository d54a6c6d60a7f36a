//! Mixed-radix indexing for implicit grids, axis 0 fastest.

fn padded(dims: &[usize]) -> [usize; 3] {
    assert!(dims.len() <= 3, "grid has {} axes, at most 3 supported", dims.len());
    let mut out = [1usize; 3];
    out[..dims.len()].copy_from_slice(dims);
    out
}

/// Linear id of the grid entry at `ijk` in a grid of extents `dims`.
///
/// Axes past `dims.len()` have extent 1 and must have index 0.
///
/// # Panics
/// If any component of `ijk` is outside its axis extent.
pub fn grid_ijk_to_id(ijk: &[usize], dims: &[usize]) -> usize {
    let dims = padded(dims);
    let mut id = 0;
    let mut stride = 1;
    for d in 0..3 {
        let i = ijk.get(d).copied().unwrap_or(0);
        assert!(i < dims[d], "grid index {i} out of range for axis {d} of extent {}", dims[d]);
        id += i * stride;
        stride *= dims[d];
    }
    id
}

/// Multi-index of linear grid id `id`, written into `ijk` (unused axes get 0).
///
/// # Panics
/// If `id` is not less than the product of `dims`.
pub fn grid_id_to_ijk(id: usize, dims: &[usize], ijk: &mut [usize; 3]) {
    let dims = padded(dims);
    let total: usize = dims.iter().product();
    assert!(id < total, "grid id {id} out of range for {total} entries");
    let mut remain = id;
    for d in 0..3 {
        ijk[d] = remain % dims[d];
        remain /= dims[d];
    }
}
