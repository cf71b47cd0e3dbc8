//! Filtered, sorted projection of the catalog for the gallery.

use feruca::Collator;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{PetRecord, SortOrder};
use crate::selection::SelectionSet;

/// Filter `catalog` by `query` and sort the result by title.
///
/// A pet matches when `query` is a case-insensitive substring of its title
/// or its description. Titles are ordered with the Unicode collation
/// algorithm (CLDR root locale), so `Émile` sorts next to `Emma` and case
/// only breaks ties. Pets whose titles are identical keep their catalog
/// order in both directions.
pub fn filter_sort(catalog: &[PetRecord], query: &str, order: SortOrder) -> Vec<PetRecord> {
    let needle = query.to_lowercase();
    let mut view: Vec<PetRecord> = catalog
        .iter()
        .filter(|pet| matches_query(pet, &needle))
        .cloned()
        .collect();

    let mut collator = Collator::default();
    // `sort_by` is stable.
    view.sort_by(|a, b| match order {
        SortOrder::AscendingTitle => collator.collate(a.title.as_str(), b.title.as_str()),
        SortOrder::DescendingTitle => collator.collate(b.title.as_str(), a.title.as_str()),
    });
    view
}

fn matches_query(pet: &PetRecord, needle: &str) -> bool {
    needle.is_empty()
        || pet.title.to_lowercase().contains(needle)
        || pet.description.to_lowercase().contains(needle)
}

/// One card of the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GalleryItem {
    #[serde(flatten)]
    pub pet: PetRecord,
    pub selected: bool,
}

/// Everything the gallery page renders.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryView {
    pub loading: bool,
    pub error: Option<String>,
    pub sort_order: SortOrder,
    pub query: String,
    /// Size of the full catalog.
    pub total: usize,
    /// Number of cards after filtering.
    pub showing: usize,
    /// Size of the selection, stale entries included.
    pub selected: usize,
    pub pets: Vec<GalleryItem>,
}

impl GalleryView {
    pub fn build(
        catalog: &[PetRecord],
        loading: bool,
        error: Option<String>,
        selection: &SelectionSet,
        query: &str,
        order: SortOrder,
    ) -> Self {
        let pets: Vec<GalleryItem> = filter_sort(catalog, query, order)
            .into_iter()
            .map(|pet| GalleryItem {
                selected: selection.contains(&pet.url),
                pet,
            })
            .collect();

        Self {
            loading,
            error,
            sort_order: order,
            query: query.to_string(),
            total: catalog.len(),
            showing: pets.len(),
            selected: selection.len(),
            pets,
        }
    }
}
