//! Reading files out of git history with gix.
//!
//! Resolves `refs/heads/<version>` to its tree, walks the tree to `page`
//! and loads the blob. Nothing here touches the working tree.

use std::path::Path;

use crate::error::VcsError;

/// Read `page` as of the tip of branch `version` in the repository at `dir`.
///
/// `product` is used for error context only.
///
/// # Errors
///
/// - [`VcsError::InvalidVersion`] if `refs/heads/<version>` does not exist
/// - [`VcsError::InvalidPage`] if the tree has no blob at `page`
/// - [`VcsError::Repository`] if the object database cannot be read
pub(crate) fn read_blob(
    dir: &Path,
    product: &str,
    version: &str,
    page: &str,
) -> Result<Vec<u8>, VcsError> {
    let repo = gix::open(dir).map_err(VcsError::repository(dir))?;

    let refname = format!("refs/heads/{version}");
    let reference = repo
        .try_find_reference(refname.as_str())
        .map_err(VcsError::repository(dir))?
        .ok_or_else(|| VcsError::InvalidVersion {
            product: product.to_owned(),
            version: version.to_owned(),
        })?;

    let tree = reference
        .into_fully_peeled_id()
        .map_err(VcsError::repository(dir))?
        .object()
        .map_err(VcsError::repository(dir))?
        .peel_to_tree()
        .map_err(VcsError::repository(dir))?;

    let invalid_page = || VcsError::InvalidPage {
        product: product.to_owned(),
        version: version.to_owned(),
        page: page.to_owned(),
    };

    let entry = tree
        .lookup_entry_by_path(page)
        .map_err(VcsError::repository(dir))?
        .ok_or_else(invalid_page)?;

    // A directory or submodule at `page` is not a page
    if !entry.mode().is_blob() {
        return Err(invalid_page());
    }

    let blob = entry.id().object().map_err(VcsError::repository(dir))?;
    Ok(blob.detach().data)
}
