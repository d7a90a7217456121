use std::path::PathBuf;
use std::sync::Arc;
use std::{fs, io};

use chrono::Utc;
use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use spdlog::{error, info, warn};

use crate::assembler::AssembleContext;
use crate::config::Config;
use crate::error::{BlogError, BlogResult};
use crate::feed::FeedChannel;
use crate::pages;
use crate::pages::Listing;
use crate::store::MemoryStore;
use crate::tags;
use crate::text_utils::{html_escape, strip_tags};
use crate::view::chrome::{render_comments, PageChrome};
use crate::view::layout::LayoutRenderer;
use crate::view::list_renderer::ListRenderer;
use crate::view::post_renderer::PostRenderer;
use crate::view::tag_index_renderer::TagIndexRenderer;
use crate::view::SidebarWidgets;
use crate::feed;
use crate::visibility::Viewer;

struct AppState {
    store: MemoryStore,
    config: Config,
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn assemble_ctx<'a>(config: &'a Config, lang: &str) -> AssembleContext<'a> {
    AssembleContext {
        base_url: &config.site.base_url,
        uploads_path: &config.site.uploads_path,
        date_pattern: &config.blog.date_pattern,
        months: config.months_for(lang),
    }
}

/// The host supplies authentication; here it degrades to a preview
/// token header matched against the configuration.
fn viewer(req: &HttpRequest, config: &Config) -> Viewer {
    let token = match config.server.preview_token {
        Some(ref token) if !token.is_empty() => token,
        _ => return Viewer::Anonymous,
    };

    match req.headers().get("x-preview-token").and_then(|v| v.to_str().ok()) {
        Some(sent) if sent == token => Viewer::Authenticated,
        _ => Viewer::Anonymous,
    }
}

fn read_template(config: &Config, file_name: &str) -> BlogResult<String> {
    let full_path = config.paths.template_dir.join(file_name);
    fs::read_to_string(&full_path)
        .map_err(|e| BlogError::Template(format!("cannot read {}: {}", file_name, e)))
}

/// Sidebar widgets are supplementary to the page they decorate: a
/// widget whose storage query fails renders as an empty block, while
/// the page's own operation still maps its failures to a 500.
fn widget_or_empty<T>(result: BlogResult<Vec<T>>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        error!("{} widget failed: {}", what, e);
        Vec::new()
    })
}

fn widgets<'a>(state: &'a AppState, lang: &'a str, now: i64) -> SidebarWidgets<'a> {
    let config = &state.config;
    SidebarWidgets::new(
        move || {
            let ctx = assemble_ctx(config, lang);
            widget_or_empty(
                pages::latest_posts_widget(&state.store, &ctx, lang, now,
                                           config.blog.latest_posts_count),
                "latest-posts")
        },
        move || {
            let ctx = assemble_ctx(config, lang);
            widget_or_empty(
                tags::popular_tags(&state.store, &ctx, lang, now,
                                   config.blog.popular_tags_count),
                "popular-tags")
        },
    )
}

fn feed_url(config: &Config, lang: &str) -> String {
    format!("{}/blog/feed/{}", config.site.base_url, lang)
}

fn og_image_url(config: &Config) -> Option<String> {
    config.site.og_image.as_ref()
        .map(|image| format!("{}{}", config.site.base_url, image))
}

/// Full page for any listing flavor: listing body, sidebar widgets,
/// OG/RSS header tags, comment widget footer, site layout. `og_title`
/// must already be HTML-escaped; the chrome and layout sinks emit it
/// verbatim.
fn render_listing_page(state: &AppState, listing: &Listing, lang: &str,
                       now: i64, og_title: &str, og_url: &str) -> BlogResult<String> {
    let config = &state.config;

    let body_src = read_template(config, "blog.tpl")?;
    let widgets = widgets(state, lang, now);
    let body = ListRenderer::new(&body_src)?.render(listing, &widgets);

    let site_title = html_escape(&config.site.title);
    let site_desc = html_escape(&config.site.description);

    let mut chrome = PageChrome::new();
    chrome.rss_link(&feed_url(config, lang));
    chrome.og_site(og_title, &site_desc, og_url, og_image_url(config).as_deref());
    let comments_src = read_template(config, "comments.tpl")?;
    chrome.append_footer(render_comments(&comments_src, false, "", og_url)?);

    let layout_src = read_template(config, "layout.tpl")?;
    let layout = LayoutRenderer::new(&layout_src)?;
    Ok(layout.render(&site_title, &site_desc, &body, &chrome))
}

fn html_response(body: String) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn error_response(state: &AppState, err: BlogError) -> web::HttpResponse {
    match err {
        BlogError::NotFound(ref what) => {
            info!("not found: {}", what);
            let body = read_template(&state.config, "404.tpl")
                .unwrap_or_else(|_| "Page not found".to_string());
            web::HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body(body)
        }
        err => {
            error!("request failed: {}", err);
            web::HttpResponse::InternalServerError()
                .body("Internal server error")
        }
    }
}

/// A bare `?search=` query redirects to the search route with the
/// phrase tag-stripped and URL-encoded.
fn search_redirect(req: &HttpRequest, config: &Config) -> Option<web::HttpResponse> {
    let query = req.uri().query()?;
    let params: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    let phrase = params.into_iter().find(|(key, _)| key == "search")?.1;

    let cleaned = strip_tags(&phrase);
    let encoded = utf8_percent_encode(&cleaned, NON_ALPHANUMERIC).to_string();
    let location = format!("{}/blog/szukaj/{}", config.site.base_url, encoded);

    Some(web::HttpResponse::TemporaryRedirect()
        .header("Location", location.as_str())
        .finish())
}

fn listing_response(state: &AppState, req: &HttpRequest, page: u32) -> web::HttpResponse {
    if let Some(redirect) = search_redirect(req, &state.config) {
        return redirect;
    }

    let config = &state.config;
    let lang = config.site.default_lang.clone();
    let now = now();
    let ctx = assemble_ctx(config, &lang);

    let result = pages::latest_listing(&state.store, &ctx, &lang, now,
                                       page, config.blog.perpage)
        .and_then(|listing| {
            let og_url = format!("{}/blog", config.site.base_url);
            render_listing_page(state, &listing, &lang, now,
                                &html_escape(&config.site.title), &og_url)
        });

    match result {
        Ok(body) => html_response(body),
        Err(err) => error_response(state, err),
    }
}

#[web::get("/blog")]
async fn blog_index(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    listing_response(&state, &req, 1)
}

#[web::get("/blog/{page}")]
async fn blog_paged(req: HttpRequest, path: web::types::Path<u32>,
                    state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    listing_response(&state, &req, path.into_inner())
}

#[web::get("/blog/wpis/{slug}")]
async fn post_view(req: HttpRequest, path: web::types::Path<String>,
                   state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let slug = path.into_inner();
    let config = &state.config;
    let now = now();

    let result = pages::find_post(&state.store, viewer(&req, config), &slug, now)
        .and_then(|post| {
            // the post's own locale drives all further localization
            let lang = post.lang.clone();
            let ctx = assemble_ctx(config, &lang);
            let view = pages::post_detail(&state.store, &ctx, &post)?;

            let body_src = read_template(config, "post.tpl")?;
            let widgets = widgets(&state, &lang, now);
            let body = PostRenderer::new(&body_src)?
                .render(&view, &config.site.title, &config.site.description, &widgets);

            let mut chrome = PageChrome::new();
            chrome.rss_link(&feed_url(config, &lang));
            chrome.og_article(&view);
            let comments_src = read_template(config, "comments.tpl")?;
            chrome.append_footer(render_comments(&comments_src, true,
                                                 &view.syndication_id, &view.url)?);

            let layout_src = read_template(config, "layout.tpl")?;
            let layout = LayoutRenderer::new(&layout_src)?;
            Ok(layout.render(&view.title, &view.summary, &body, &chrome))
        });

    match result {
        Ok(body) => html_response(body),
        Err(err) => error_response(&state, err),
    }
}

fn tag_listing_response(state: &AppState, slug: &str, page: u32) -> web::HttpResponse {
    let config = &state.config;
    let lang = config.site.default_lang.clone();
    let now = now();
    let ctx = assemble_ctx(config, &lang);

    let result = pages::tag_listing(&state.store, &ctx, &lang, now,
                                    slug, page, config.blog.perpage)
        .and_then(|listing| {
            let og_url = format!("{}/blog/temat/{}", config.site.base_url, slug);
            let og_title = listing.header.clone()
                .unwrap_or_else(|| html_escape(&config.site.title));
            render_listing_page(state, &listing, &lang, now, &og_title, &og_url)
        });

    match result {
        Ok(body) => html_response(body),
        Err(err) => error_response(state, err),
    }
}

#[web::get("/blog/temat/{slug}")]
async fn tag_view(path: web::types::Path<String>,
                  state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    tag_listing_response(&state, &path.into_inner(), 1)
}

#[web::get("/blog/temat/{slug}/{page}")]
async fn tag_view_paged(path: web::types::Path<(String, u32)>,
                        state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let (slug, page) = path.into_inner();
    tag_listing_response(&state, &slug, page)
}

fn author_listing_response(state: &AppState, id: &str, page: u32) -> web::HttpResponse {
    let config = &state.config;
    let lang = config.site.default_lang.clone();
    let now = now();
    let ctx = assemble_ctx(config, &lang);

    let result = id.parse::<i64>()
        .map_err(|_| BlogError::not_found(format!("author {}", id)))
        .and_then(|author_id| {
            pages::author_listing(&state.store, &ctx, &lang, now,
                                  author_id, page, config.blog.perpage)
        })
        .and_then(|listing| {
            let og_url = format!("{}/blog/autor/{}", config.site.base_url, id);
            let og_title = listing.header.clone()
                .unwrap_or_else(|| html_escape(&config.site.title));
            render_listing_page(state, &listing, &lang, now, &og_title, &og_url)
        });

    match result {
        Ok(body) => html_response(body),
        Err(err) => error_response(state, err),
    }
}

#[web::get("/blog/autor/{id}")]
async fn author_view(path: web::types::Path<String>,
                     state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    author_listing_response(&state, &path.into_inner(), 1)
}

#[web::get("/blog/autor/{id}/{page}")]
async fn author_view_paged(path: web::types::Path<(String, u32)>,
                           state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let (id, page) = path.into_inner();
    author_listing_response(&state, &id, page)
}

fn search_response(state: &AppState, raw_phrase: &str, page: u32) -> web::HttpResponse {
    let config = &state.config;
    let lang = config.site.default_lang.clone();
    let now = now();
    let ctx = assemble_ctx(config, &lang);

    let result = pages::search_listing(&state.store, &ctx, &lang, now, raw_phrase,
                                       page, config.blog.perpage,
                                       config.blog.strict_search_visibility)
        .and_then(|results| {
            let og_url = format!("{}/blog/szukaj/{}", config.site.base_url, results.phrase.raw);
            let og_title = results.listing.header.clone()
                .unwrap_or_else(|| html_escape(&config.site.title));
            render_listing_page(state, &results.listing, &lang, now, &og_title, &og_url)
        });

    match result {
        Ok(body) => html_response(body),
        Err(err) => error_response(state, err),
    }
}

#[web::get("/blog/szukaj/{phrase}")]
async fn search_view(path: web::types::Path<String>,
                     state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    search_response(&state, &path.into_inner(), 1)
}

#[web::get("/blog/szukaj/{phrase}/{page}")]
async fn search_view_paged(path: web::types::Path<(String, String)>,
                           state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let (phrase, page_or_tail) = path.into_inner();
    // a numeric second segment is a page; anything else belongs to the
    // phrase (the old router was greedy and some links still are)
    match page_or_tail.parse::<u32>() {
        Ok(page) => search_response(&state, &phrase, page),
        Err(_) => search_response(&state, &format!("{}/{}", phrase, page_or_tail), 1),
    }
}

#[web::get("/blog/feed/{lang}")]
async fn rss_feed(path: web::types::Path<String>,
                  state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let lang = path.into_inner();
    let config = &state.config;
    let ctx = assemble_ctx(config, &lang);

    let channel = FeedChannel {
        title: &config.site.title,
        link: &config.site.base_url,
        description: &config.site.description,
    };

    match feed::generate(&state.store, &ctx, &channel, &lang, now()) {
        Ok(xml) => web::HttpResponse::Ok()
            .content_type("application/xml")
            .body(xml),
        Err(err) => error_response(&state, err),
    }
}

fn tag_index_response(state: &AppState, page: u32) -> web::HttpResponse {
    let config = &state.config;
    let lang = config.site.default_lang.clone();
    let now = now();
    let ctx = assemble_ctx(config, &lang);

    let result = tags::tag_index(&state.store, &ctx, &lang, now,
                                 page, config.blog.subjects_perpage)
        .and_then(|(entries, pagination)| {
            let body_src = read_template(config, "tematy.tpl")?;
            let body = TagIndexRenderer::new(&body_src)?
                .render(&config.blog.subjects_title, &config.blog.subjects_desc,
                        &entries, &pagination);

            let page_title = html_escape(&config.blog.subjects_title);
            let page_desc = html_escape(&config.blog.subjects_desc);

            let mut chrome = PageChrome::new();
            chrome.og_site(&page_title, &page_desc,
                           &format!("{}/tematy", config.site.base_url),
                           og_image_url(config).as_deref());

            let layout_src = read_template(config, "layout.tpl")?;
            let layout = LayoutRenderer::new(&layout_src)?;
            Ok(layout.render(&page_title, &page_desc, &body, &chrome))
        });

    match result {
        Ok(body) => html_response(body),
        Err(err) => error_response(state, err),
    }
}

#[web::get("/tematy")]
async fn tag_index_view(state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    tag_index_response(&state, 1)
}

#[web::get("/tematy/{page}")]
async fn tag_index_paged(path: web::types::Path<u32>,
                         state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    tag_index_response(&state, path.into_inner())
}

fn get_file(root_dir: &PathBuf, dir: String, file: String) -> Result<NamedFile, web::Error> {
    if dir.contains("../") || file.contains("../") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = root_dir.join(dir).join(file);
    Ok(NamedFile::open(file_path)?)
}

#[web::get("/uploads/{dir}/{file}")]
async fn upload_files(path: web::types::Path<(String, String)>,
                      state: web::types::State<Arc<AppState>>) -> Result<NamedFile, web::Error> {
    let (dir, file) = path.into_inner();
    get_file(&state.config.paths.uploads_dir, dir, file)
}

#[web::get("/public/{file_name}")]
async fn public_files(path: web::types::Path<String>,
                      state: web::types::State<Arc<AppState>>) -> Result<NamedFile, web::Error> {
    if path.contains("../") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let store = MemoryStore::from_file(&config.paths.data_file)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData,
                                    format!("Error loading blog data: {}", e)))?;
    info!("Loaded {} posts from {}", store.post_count(),
          config.paths.data_file.to_str().unwrap_or("?"));

    if config.server.preview_token.is_none() {
        warn!("No preview token configured; unpublished posts are not reachable");
    }

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    let app_state = Arc::new(AppState { store, config });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(blog_index)
            .service(blog_paged)
            .service(post_view)
            .service(tag_view)
            .service(tag_view_paged)
            .service(author_view)
            .service(author_view_paged)
            .service(search_view)
            .service(search_view_paged)
            .service(rss_feed)
            .service(tag_index_view)
            .service(tag_index_paged)
            .service(upload_files)
            .service(public_files)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_widget_degrades_to_empty() {
        let out: Vec<i64> =
            widget_or_empty(Err(BlogError::Storage("backend down".to_string())), "latest-posts");
        assert!(out.is_empty());

        let out = widget_or_empty(Ok(vec![1, 2]), "latest-posts");
        assert_eq!(out, vec![1, 2]);
    }
}
