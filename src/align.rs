//! Page-alignment helpers. Windows are always page-aligned on both ends.

use once_cell::sync::Lazy;

use crate::sys;

pub static PAGE_SIZE: Lazy<usize> = Lazy::new(sys::get_page_size);

/// Rounds `len` up to the next multiple of the page size.
pub fn align_up(len: usize) -> usize {
    let page = *PAGE_SIZE;
    let rem = len % page;
    len + if rem > 0 { page - rem } else { 0 }
}

/// Rounds `len` down to the previous multiple of the page size.
pub fn align_down(len: usize) -> usize {
    let page = *PAGE_SIZE;
    (len / page) * page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment() {
        let page = sys::get_page_size();
        assert_eq!(align_up(1), page);
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(page), page);
        assert_eq!(align_up(page + 1), 2 * page);

        assert_eq!(align_down(1), 0);
        assert_eq!(align_down(0), 0);
        assert_eq!(align_down(page), page);
        assert_eq!(align_down(page + 1), page);
    }
}
