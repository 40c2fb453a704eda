use crate::{RwMap, Snapshot};
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::fmt::{self, Formatter};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

struct RwMapVisitor<K, V, S> {
    key_marker: PhantomData<K>,
    value_marker: PhantomData<V>,
    hash_builder_marker: PhantomData<S>,
}

impl<K, V, S> Serialize for Snapshot<K, V, S>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

impl<K, V, S> Serialize for RwMap<K, V, S>
where
    K: Serialize + Hash + Eq + Clone,
    V: Serialize + Clone,
    S: BuildHasher + Clone,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        self.snapshot().serialize(serializer)
    }
}

impl<'de, K, V, S> Deserialize<'de> for RwMap<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq + Clone,
    V: Deserialize<'de> + Clone,
    S: Default + BuildHasher + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RwMapVisitor::new())
    }
}

impl<K, V, S> RwMapVisitor<K, V, S> {
    pub(crate) fn new() -> Self {
        Self {
            key_marker: PhantomData,
            value_marker: PhantomData,
            hash_builder_marker: PhantomData,
        }
    }
}

impl<'de, K, V, S> Visitor<'de> for RwMapVisitor<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq + Clone,
    V: Deserialize<'de> + Clone,
    S: Default + BuildHasher + Clone,
{
    type Value = RwMap<K, V, S>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let map = match access.size_hint() {
            Some(n) => RwMap::with_capacity_and_hasher(n, S::default()),
            None => RwMap::with_hasher(S::default()),
        };

        // a repeated key keeps its last value, like `HashMap` does.
        while let Some((key, value)) = access.next_entry()? {
            map.store(key, value);
        }
        // a freshly deserialized map is read far more than it is written.
        map.force_merge();

        Ok(map)
    }
}

#[cfg(test)]
mod test {
    use crate::RwMap;

    #[test]
    fn test_map() {
        let map: RwMap<u8, u8> = RwMap::with_capacity(5);

        map.store(0, 4);
        map.store(1, 3);
        map.store(2, 2);
        map.store(3, 1);
        map.store(4, 0);

        let serialized = serde_json::to_string(&map).expect("Couldn't serialize map");
        let deserialized: RwMap<u8, u8> =
            serde_json::from_str(&serialized).expect("Couldn't deserialize map");

        assert_eq!(map, deserialized);
    }

    #[test]
    fn test_snapshot() {
        let map: RwMap<String, u32> = RwMap::new();
        map.store(String::from("a"), 1);

        let serialized = serde_json::to_string(&map.snapshot()).expect("Couldn't serialize");
        assert_eq!(serialized, r#"{"a":1}"#);
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let map: RwMap<String, u32> =
            serde_json::from_str(r#"{"a":1,"a":2}"#).expect("Couldn't deserialize map");
        assert_eq!(map.load("a"), Some(2));
        assert_eq!(map.len(), 1);
    }
}
