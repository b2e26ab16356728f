/// Default number of episodes per page
pub const PAGE_SIZE: usize = 100;

/// Number of pages needed to show `len` items, `ceil(len / page_size)`
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Items visible on 1-based `page`: `[(page-1)*size, page*size)` clipped to the slice
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = page.saturating_mul(page_size).min(items.len());
    &items[start..end]
}

/// Offset of the first item on `page` within the full list
pub fn page_offset(page: usize, page_size: usize) -> usize {
    page.saturating_sub(1).saturating_mul(page_size)
}
