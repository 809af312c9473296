use crate::database::models::{PostRecord, UserRecord};
use crate::database::repositories::{
    FollowRepository, GroupRepository, PostRepository, SqliteRepositories, UserRepository,
};
use crate::database::Database;
use crate::groups::GroupView;
use crate::posting::{build_post_view, PostView};
use anyhow::Result;
use serde::Serialize;

pub const PAGE_SIZE: usize = 10;

/// Assembles the paginated post listings: everything, one group, one
/// author, or the authors the viewer follows.
#[derive(Clone)]
pub struct FeedService {
    database: Database,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    pub page_number: usize,
    pub total_pages: usize,
    pub total_posts: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: GroupView,
    #[serde(flatten)]
    pub page: FeedPage,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: AuthorContext,
    #[serde(flatten)]
    pub page: FeedPage,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorContext {
    pub username: String,
    pub joined_at: String,
    pub post_count: u64,
    /// Whether the requesting user follows this author; absent for
    /// anonymous viewers.
    pub viewer_follows: Option<bool>,
}

struct PageWindow {
    number: usize,
    offset: usize,
    total_pages: usize,
}

/// Out-of-range requests land on the nearest real page rather than an
/// empty one: page 9 of 13 records serves the same 3 posts as page 2.
fn clamp_page(requested: usize, total_posts: u64) -> PageWindow {
    let total_pages = (total_posts as usize).div_ceil(PAGE_SIZE).max(1);
    let number = requested.clamp(1, total_pages);
    PageWindow {
        number,
        offset: (number - 1) * PAGE_SIZE,
        total_pages,
    }
}

fn assemble_page(
    repos: &SqliteRepositories<'_>,
    window: PageWindow,
    total_posts: u64,
    records: Vec<PostRecord>,
) -> Result<FeedPage> {
    let mut posts = Vec::with_capacity(records.len());
    for record in records {
        posts.push(build_post_view(repos, record)?);
    }
    Ok(FeedPage {
        posts,
        page_number: window.number,
        total_pages: window.total_pages,
        total_posts,
        has_previous: window.number > 1,
        has_next: window.number < window.total_pages,
    })
}

impl FeedService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn index_page(&self, page: usize) -> Result<FeedPage> {
        self.database.with_repositories(|repos| {
            let total = repos.posts().count_all()?;
            let window = clamp_page(page, total);
            let records = repos.posts().list_recent(PAGE_SIZE, window.offset)?;
            assemble_page(&repos, window, total, records)
        })
    }

    pub fn group_page(&self, slug: &str, page: usize) -> Result<Option<GroupFeed>> {
        self.database.with_repositories(|repos| {
            let Some(group) = repos.groups().get_by_slug(slug)? else {
                return Ok(None);
            };
            let total = repos.posts().count_for_group(&group.id)?;
            let window = clamp_page(page, total);
            let records = repos
                .posts()
                .list_for_group(&group.id, PAGE_SIZE, window.offset)?;
            let page = assemble_page(&repos, window, total, records)?;
            Ok(Some(GroupFeed {
                group: GroupView::from_record(group),
                page,
            }))
        })
    }

    pub fn profile_page(
        &self,
        username: &str,
        page: usize,
        viewer: Option<&UserRecord>,
    ) -> Result<Option<ProfileFeed>> {
        self.database.with_repositories(|repos| {
            let Some(author) = repos.users().get_by_username(username)? else {
                return Ok(None);
            };
            let total = repos.posts().count_for_author(&author.id)?;
            let window = clamp_page(page, total);
            let records = repos
                .posts()
                .list_for_author(&author.id, PAGE_SIZE, window.offset)?;
            let page = assemble_page(&repos, window, total, records)?;

            let viewer_follows = match viewer {
                Some(viewer) => Some(repos.follows().is_following(&viewer.id, &author.id)?),
                None => None,
            };
            Ok(Some(ProfileFeed {
                author: AuthorContext {
                    username: author.username,
                    joined_at: author.joined_at,
                    post_count: total,
                    viewer_follows,
                },
                page,
            }))
        })
    }

    /// Posts authored by accounts the user follows.
    pub fn following_page(&self, user: &UserRecord, page: usize) -> Result<FeedPage> {
        self.database.with_repositories(|repos| {
            let total = repos.posts().count_followed_by(&user.id)?;
            let window = clamp_page(page, total);
            let records = repos
                .posts()
                .list_followed_by(&user.id, PAGE_SIZE, window.offset)?;
            assemble_page(&repos, window, total, records)
        })
    }
}
