/*!
 * Ordered allow-list matching over media entities.
 *
 * A [`ValueMatcher`] pairs an optional allow-list with a projection that maps
 * an entity to the value compared against it. Filtering follows the order of
 * the allow-list, not the order of the collection, so the first configured
 * language produces the first audio streams.
 */

use std::fmt;
use crate::media::{Title, Track};

/// Allow-list selector over entities of type `T` compared by a projected `V`
#[derive(Clone)]
pub struct ValueMatcher<T, V> {
    allowed: Option<Vec<V>>,
    projection: fn(&T) -> V,
}

impl<T, V: PartialEq> ValueMatcher<T, V> {
    /// Create a matcher. `None` means every entity matches.
    pub fn new(allowed: Option<Vec<V>>, projection: fn(&T) -> V) -> Self {
        ValueMatcher { allowed, projection }
    }

    /// The configured allow-list, if any
    pub fn allowed(&self) -> Option<&[V]> {
        self.allowed.as_deref()
    }

    /// True if no allow-list is configured or the projected value is in it
    pub fn matches(&self, item: &T) -> bool {
        match &self.allowed {
            None => true,
            Some(allowed) => allowed.contains(&(self.projection)(item)),
        }
    }

    /// Select entities in allow-list priority order.
    ///
    /// For each allowed value, every element projecting to it is emitted in
    /// collection order. With `skip_duplicate_values` a value is emitted at
    /// most once over the whole call. With `first_only` the call returns after
    /// the first emitted element. Without an allow-list the collection is
    /// returned unchanged.
    pub fn filter<'a>(&self, items: &'a [T], first_only: bool, skip_duplicate_values: bool) -> Vec<&'a T> {
        let Some(allowed) = &self.allowed else {
            return items.iter().collect();
        };

        let mut filtered = Vec::new();
        let mut emitted: Vec<V> = Vec::new();

        for wanted in allowed {
            for item in items {
                let value = (self.projection)(item);
                if value != *wanted {
                    continue;
                }
                if skip_duplicate_values && emitted.contains(&value) {
                    continue;
                }
                emitted.push(value);
                filtered.push(item);
                if first_only {
                    return filtered;
                }
            }
        }

        filtered
    }
}

impl ValueMatcher<Title, u32> {
    /// Match titles by their position
    pub fn by_position(allowed: Option<Vec<u32>>) -> Self {
        ValueMatcher::new(allowed, title_position)
    }
}

impl<T: Track> ValueMatcher<T, String> {
    /// Match audio or subtitle tracks by their language code
    pub fn by_language(allowed: Option<Vec<String>>) -> Self {
        ValueMatcher::new(allowed, track_language::<T>)
    }
}

impl<T, V: fmt::Debug> fmt::Debug for ValueMatcher<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueMatcher")
            .field("allowed", &self.allowed)
            .finish()
    }
}

fn title_position(title: &Title) -> u32 {
    title.position
}

fn track_language<T: Track>(track: &T) -> String {
    track.language().unwrap_or_default().to_string()
}
