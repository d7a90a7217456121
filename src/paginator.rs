/// One numbered page link handed to the pagination template block.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLink {
    pub number: u32,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub current: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub links: Vec<PageLink>,
}

/// Page numbers are 1-based and only clamped from below. A page past the
/// last one is still a valid request; it simply selects zero rows.
pub fn clamp_page(page: u32) -> u32 {
    page.max(1)
}

/// Row offset of a (already clamped) page.
pub fn offset(page: u32, page_size: u32) -> u64 {
    (page as u64 - 1) * page_size as u64
}

/// Pagination arithmetic plus the page-link URLs (`<base_path>/<n>`).
pub fn paginate(page: u32, page_size: u32, total_count: u64, base_path: &str) -> PageResult {
    let page = clamp_page(page);
    let total_pages = if total_count == 0 {
        0
    } else {
        ((total_count - 1) / page_size as u64 + 1) as u32
    };

    let links = (1..=total_pages)
        .map(|number| PageLink {
            number,
            url: format!("{}/{}", base_path, number),
        })
        .collect();

    let prev_url = if page > 1 {
        Some(format!("{}/{}", base_path, page - 1))
    } else {
        None
    };

    let next_url = if (page as u64) * (page_size as u64) < total_count {
        Some(format!("{}/{}", base_path, page + 1))
    } else {
        None
    };

    PageResult {
        current: page,
        total_count,
        total_pages,
        prev_url,
        next_url,
        links,
    }
}
