/// Supplies the default collection for an empty slot.
///
/// Implementations must be pure and deterministic: the same call always
/// yields the same records, in the same order.
pub trait SeedProvider<T> {
    fn seed(&self) -> Vec<T>;
}

impl<T, F> SeedProvider<T> for F
where
    F: Fn() -> Vec<T>,
{
    fn seed(&self) -> Vec<T> {
        self()
    }
}

/// Seeds from a fixed list of records.
pub fn static_seed<T: Clone>(records: Vec<T>) -> impl SeedProvider<T> {
    move || records.clone()
}
