// Table and column names are read by other tools; keep them stable.
pub const SCHEMA: &str = r#"
-- articles table
CREATE TABLE IF NOT EXISTS articles (
    id TEXT PRIMARY KEY,
    title TEXT,
    originalTitle TEXT,
    link TEXT,
    pubDate TEXT,
    contentSnippet TEXT,
    source TEXT,
    imageUrl TEXT,
    aiSummary TEXT,
    createdAt DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_articles_pub_date ON articles(pubDate DESC);

-- comments table
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    articleId TEXT,
    commentId INTEGER,
    text TEXT,
    name TEXT,
    isVIP BOOLEAN,
    time TEXT,
    FOREIGN KEY (articleId) REFERENCES articles(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_comments_article_comment ON comments(articleId, commentId);
"#;
