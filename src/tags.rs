use crate::assembler::AssembleContext;
use crate::error::BlogResult;
use crate::paginator;
use crate::paginator::PageResult;
use crate::store::{DateOrder, Store};
use crate::text_utils::html_escape;
use crate::visibility::PostFilter;

/// How many preview posts a tag-index entry carries.
const PREVIEW_POSTS: u32 = 3;

/// One entry of the "popular tags" sidebar widget.
#[derive(Debug, Clone, ramhorns::Content)]
pub struct PopularTag {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub count: u64,
}

#[derive(Debug, Clone, ramhorns::Content)]
pub struct TagPreviewPost {
    pub title: String,
    pub url: String,
}

/// One entry of the paginated tag index: the tag, its qualifying-post
/// count, up to three recent posts and a representative cover taken
/// from the newest of them.
#[derive(Debug, Clone, ramhorns::Content)]
pub struct TagIndexEntry {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub count: u64,
    pub cover_url: Option<String>,
    pub posts: Vec<TagPreviewPost>,
}

/// Top-N most used tags under the listing visibility rules. Ties order
/// by tag name (the store guarantees it), so the widget is stable
/// between requests.
pub fn popular_tags(store: &dyn Store, ctx: &AssembleContext,
                    lang: &str, now: i64, limit: usize) -> BlogResult<Vec<PopularTag>> {
    let filter = PostFilter::listing(lang, now);
    let mut counts = store.tag_counts(&filter)?;
    counts.truncate(limit);

    Ok(counts.into_iter()
        .map(|entry| PopularTag {
            url: ctx.tag_url(&entry.tag.slug),
            name: entry.tag.name,
            slug: entry.tag.slug,
            count: entry.count,
        })
        .collect())
}

/// One page of the tag index. The aggregation is the same as for the
/// popular-tags widget; the page window plus the per-tag previews are
/// what differ.
pub fn tag_index(store: &dyn Store, ctx: &AssembleContext, lang: &str, now: i64,
                 page: u32, per_page: u32) -> BlogResult<(Vec<TagIndexEntry>, PageResult)> {
    let filter = PostFilter::listing(lang, now);
    let counts = store.tag_counts(&filter)?;

    let page = paginator::clamp_page(page);
    let pagination = paginate_index(ctx, page, per_page, counts.len() as u64);

    let start = paginator::offset(page, per_page).min(counts.len() as u64) as usize;
    let end = (start + per_page as usize).min(counts.len());

    let mut entries = Vec::with_capacity(end - start);
    for entry in &counts[start..end] {
        // previews come newest first; the store breaks publication-time
        // ties by id, which fixes which post donates the cover
        let previews = store.posts_for_tag(entry.tag.id, &filter,
                                           DateOrder::Newest, Some(PREVIEW_POSTS), 0)?;

        let cover_url = previews.first()
            .and_then(|post| ctx.cover_url(post.cover_thumbnail.as_deref(), post.published_at));

        let posts = previews.iter()
            .map(|post| TagPreviewPost {
                title: html_escape(&post.title),
                url: ctx.post_url(&post.slug),
            })
            .collect();

        entries.push(TagIndexEntry {
            name: entry.tag.name.clone(),
            slug: entry.tag.slug.clone(),
            url: ctx.tag_url(&entry.tag.slug),
            count: entry.count,
            cover_url,
            posts,
        });
    }

    Ok((entries, pagination))
}

fn paginate_index(ctx: &AssembleContext, page: u32, per_page: u32, total: u64) -> PageResult {
    let base = format!("{}/tematy", ctx.base_url);
    paginator::paginate(page, per_page, total, &base)
}
