use crate::RwMap;
use rayon::iter::{FromParallelIterator, IntoParallelIterator, ParallelExtend, ParallelIterator};
use std::hash::{BuildHasher, Hash};

impl<K, V, S> ParallelExtend<(K, V)> for RwMap<K, V, S>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher + Clone + Send + Sync,
{
    // This is of limited use due to the `&mut self` parameter. See `par_extend_sync`
    fn par_extend<I>(&mut self, par_iter: I)
    where
        I: IntoParallelIterator<Item = (K, V)>,
    {
        self.par_extend_sync(par_iter);
    }
}

impl<K, V, S> ParallelExtend<(K, V)> for &RwMap<K, V, S>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher + Clone + Send + Sync,
{
    fn par_extend<I>(&mut self, par_iter: I)
    where
        I: IntoParallelIterator<Item = (K, V)>,
    {
        self.par_extend_sync(par_iter);
    }
}

impl<K, V, S> RwMap<K, V, S>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher + Clone + Send + Sync,
{
    fn par_extend_sync<I>(&self, par_iter: I)
    where
        I: IntoParallelIterator<Item = (K, V)>,
    {
        par_iter.into_par_iter().for_each(|(k, v)| {
            self.store(k, v);
        });
    }
}

impl<K, V> FromParallelIterator<(K, V)> for RwMap<K, V, crate::DefaultHashBuilder>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: IntoParallelIterator<Item = (K, V)>,
    {
        let mut created_map = RwMap::new();
        created_map.par_extend(par_iter);
        // everything is brand new, so move it out of the hot table in one go.
        created_map.force_merge();
        created_map
    }
}

#[cfg(test)]
mod test {
    use crate::RwMap;
    use rayon::iter::{
        FromParallelIterator, IntoParallelIterator, ParallelExtend, ParallelIterator,
    };

    #[test]
    fn parallel_extend_by_nothing() {
        let to_extend_with = Vec::new();

        let mut map = RwMap::new();
        map.store(1, 2);
        map.store(3, 4);

        map.par_extend(to_extend_with.into_par_iter());

        assert_eq!(map.len(), 2);

        assert_eq!(map.load(&1), Some(2));
        assert_eq!(map.load(&3), Some(4));
    }

    #[test]
    fn parallel_extend_by_a_bunch() {
        let mut to_extend_with = Vec::new();
        for i in 0..100 {
            to_extend_with.push((i + 100, i * 10));
        }

        let mut map = RwMap::new();
        map.store(1, 2);
        map.store(3, 4);

        map.par_extend(to_extend_with.into_par_iter());
        assert_eq!(map.len(), 102);

        assert_eq!(map.load(&1), Some(2));
        assert_eq!(map.load(&3), Some(4));
        assert_eq!(map.load(&100), Some(0));
        assert_eq!(map.load(&199), Some(990));
    }

    #[test]
    fn parallel_extend_through_shared_reference() {
        let map = RwMap::new();
        (&map).par_extend((0..64).into_par_iter().map(|i| (i, i)));
        assert_eq!(map.len(), 64);
    }

    #[test]
    fn from_empty_parallel_iter() {
        let to_create_from: Vec<(i32, i32)> = Vec::new();
        let created_map: RwMap<i32, i32> = RwMap::from_par_iter(to_create_from.into_par_iter());
        assert_eq!(created_map.len(), 0);
    }

    #[test]
    fn from_large_parallel_iter() {
        let mut to_create_from: Vec<(i32, i32)> = Vec::new();
        for i in 0..100 {
            to_create_from.push((i + 100, i * 10));
        }
        let created_map: RwMap<i32, i32> = RwMap::from_par_iter(to_create_from.into_par_iter());
        assert_eq!(created_map.len(), 100);

        assert_eq!(created_map.load(&100), Some(0));
        assert_eq!(created_map.load(&199), Some(990));
    }
}
