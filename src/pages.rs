use crate::assembler::{assemble_card, assemble_page, AssembleContext, PostCard, PostPage};
use crate::error::{BlogError, BlogResult};
use crate::model::Post;
use crate::paginator;
use crate::paginator::PageResult;
use crate::search;
use crate::search::SearchPhrase;
use crate::store::{DateOrder, Store};
use crate::text_utils::html_escape;
use crate::visibility::{PostFilter, Viewer};

/// One listing page of any flavor (latest, tag, author, search):
/// enriched cards, pagination, and an optional page header line.
pub struct Listing {
    pub header: Option<String>,
    pub posts: Vec<PostCard>,
    pub pagination: PageResult,
}

/// Search results also carry the sanitized phrase for redisplay.
pub struct SearchListing {
    pub phrase: SearchPhrase,
    pub listing: Listing,
}

/// Fetches the author and tag rows of each post and assembles the
/// cards. Ordering of the input rows is preserved; a post whose author
/// row is missing still yields a card, just without a byline.
fn enrich(store: &dyn Store, ctx: &AssembleContext, posts: &[Post]) -> BlogResult<Vec<PostCard>> {
    let mut cards = Vec::with_capacity(posts.len());
    for post in posts {
        let author = store.author(post.author_id)?;
        let tags = store.tags_for_post(post.id)?;
        cards.push(assemble_card(ctx, post, author.as_ref(), &tags));
    }
    Ok(cards)
}

fn window(store: &dyn Store, ctx: &AssembleContext, filter: &PostFilter,
          page: u32, per_page: u32, base_path: &str) -> BlogResult<Listing> {
    let page = paginator::clamp_page(page);
    let posts = store.posts(filter, DateOrder::Newest,
                            Some(per_page), paginator::offset(page, per_page))?;
    let total = store.count_posts(filter)?;

    Ok(Listing {
        header: None,
        posts: enrich(store, ctx, &posts)?,
        pagination: paginator::paginate(page, per_page, total, base_path),
    })
}

/// The `blog[/<page>]` listing.
pub fn latest_listing(store: &dyn Store, ctx: &AssembleContext, lang: &str,
                      now: i64, page: u32, per_page: u32) -> BlogResult<Listing> {
    let filter = PostFilter::listing(lang, now);
    let base = format!("{}/blog", ctx.base_url);
    window(store, ctx, &filter, page, per_page, &base)
}

/// The `blog/temat/<slug>[/<page>]` listing. Unknown tag slug is a
/// NotFound, not an empty page.
pub fn tag_listing(store: &dyn Store, ctx: &AssembleContext, lang: &str, now: i64,
                   slug: &str, page: u32, per_page: u32) -> BlogResult<Listing> {
    let tag = store.tag_by_slug(slug)?
        .ok_or_else(|| BlogError::not_found(format!("tag {}", slug)))?;

    let filter = PostFilter::listing(lang, now);
    let page = paginator::clamp_page(page);
    let posts = store.posts_for_tag(tag.id, &filter, DateOrder::Newest,
                                    Some(per_page), paginator::offset(page, per_page))?;
    let total = store.count_posts_for_tag(tag.id, &filter)?;
    let base = format!("{}/blog/temat/{}", ctx.base_url, tag.slug);

    Ok(Listing {
        header: Some(format!("Temat: {}", html_escape(&tag.name))),
        posts: enrich(store, ctx, &posts)?,
        pagination: paginator::paginate(page, per_page, total, &base),
    })
}

/// The `blog/autor/<id>[/<page>]` listing. Unknown author id is a
/// NotFound.
pub fn author_listing(store: &dyn Store, ctx: &AssembleContext, lang: &str, now: i64,
                      author_id: i64, page: u32, per_page: u32) -> BlogResult<Listing> {
    let author = store.author(author_id)?
        .ok_or_else(|| BlogError::not_found(format!("author {}", author_id)))?;

    let filter = PostFilter::listing(lang, now).with_author(author.id);
    let base = format!("{}/blog/autor/{}", ctx.base_url, author.id);
    let mut listing = window(store, ctx, &filter, page, per_page, &base)?;
    listing.header = Some(format!("Autor: {}", html_escape(author.display_name())));
    Ok(listing)
}

/// The `blog/szukaj/<phrase>[/<page>]` listing. A `/<page>` still glued
/// to the phrase by the router wins over the route page parameter.
pub fn search_listing(store: &dyn Store, ctx: &AssembleContext, lang: &str, now: i64,
                      raw_input: &str, route_page: u32, per_page: u32,
                      strict: bool) -> BlogResult<SearchListing> {
    let (raw_phrase, suffix_page) = search::split_page_suffix(raw_input);
    let page = if raw_phrase == raw_input { route_page } else { suffix_page };
    let page = paginator::clamp_page(page);

    let phrase = SearchPhrase::parse(raw_phrase);
    let (filter, order) = search::plan(lang, now, strict);

    let posts = store.search_posts(&phrase.sanitized, &filter, order,
                                   Some(per_page), paginator::offset(page, per_page))?;
    let total = store.count_search(&phrase.sanitized, &filter)?;

    // pagination links keep the phrase exactly as it arrived
    let base = format!("{}/blog/szukaj/{}", ctx.base_url, phrase.raw);

    let listing = Listing {
        header: Some(format!("Szukaj: {}", phrase.sanitized)),
        posts: enrich(store, ctx, &posts)?,
        pagination: paginator::paginate(page, per_page, total, &base),
    };

    Ok(SearchListing { phrase, listing })
}

/// Locates the post behind `blog/wpis/<slug>` under detail-view
/// visibility. Returned separately from assembly because the post's own
/// locale drives the localization of everything rendered after it.
pub fn find_post(store: &dyn Store, viewer: Viewer, slug: &str, now: i64) -> BlogResult<Post> {
    let filter = PostFilter::detail(viewer, slug, now);
    let mut posts = store.posts(&filter, DateOrder::Newest, Some(1), 0)?;
    posts.pop().ok_or_else(|| BlogError::not_found(format!("post {}", slug)))
}

/// Full detail view of an already located post.
pub fn post_detail(store: &dyn Store, ctx: &AssembleContext, post: &Post) -> BlogResult<PostPage> {
    let author = store.author(post.author_id)?;
    let tags = store.tags_for_post(post.id)?;
    Ok(assemble_page(ctx, post, author.as_ref(), &tags))
}

/// The "latest posts" widget: a handful of newest visible posts,
/// enriched like listing cards.
pub fn latest_posts_widget(store: &dyn Store, ctx: &AssembleContext, lang: &str,
                           now: i64, count: usize) -> BlogResult<Vec<PostCard>> {
    let filter = PostFilter::listing(lang, now);
    let posts = store.posts(&filter, DateOrder::Newest, Some(count as u32), 0)?;
    enrich(store, ctx, &posts)
}
