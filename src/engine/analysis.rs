//! Note analysis: topic classification and comment guidance
//!
//! Pure functions over extracted text. No I/O, deterministic.

use serde::Serialize;

use super::extract::Note;

/// Topic tag applied when nothing else matches
pub const DEFAULT_DOMAIN: &str = "生活";

/// Fixed topic → keyword dictionaries. A tag applies when any of its
/// keywords appears (case-insensitive substring) in title + body.
const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("美食", &["美食", "好吃", "餐厅", "探店", "菜谱", "小吃", "食谱"]),
    ("旅行", &["旅行", "旅游", "景点", "酒店", "出行", "攻略", "民宿"]),
    ("美妆", &["美妆", "化妆", "护肤", "口红", "面膜", "精华"]),
    ("穿搭", &["穿搭", "搭配", "时尚", "衣服", "鞋子", "包包"]),
    ("健身", &["健身", "运动", "减肥", "瑜伽", "跑步", "塑形"]),
    ("数码", &["数码", "手机", "电脑", "相机", "测评", "耳机"]),
    ("母婴", &["母婴", "宝宝", "育儿", "辅食", "孕期"]),
    ("家居", &["家居", "装修", "收纳", "家具", "软装"]),
];

/// Map extracted text to topic tags.
///
/// Returns a set (insertion-ordered, no duplicates); falls back to the
/// single default tag when no dictionary keyword matches.
pub fn classify(title: &str, body: &str) -> Vec<String> {
    let text = format!("{title} {body}").to_lowercase();

    let mut tags: Vec<String> = Vec::new();
    for (domain, keywords) in DOMAIN_KEYWORDS {
        if keywords.iter().any(|kw| text.contains(&kw.to_lowercase())) {
            tags.push((*domain).to_string());
        }
    }

    if tags.is_empty() {
        tags.push(DEFAULT_DOMAIN.to_string());
    }
    tags
}

/// Every dictionary keyword present in the text, for downstream comment
/// generation context.
pub fn matched_keywords(title: &str, body: &str) -> Vec<String> {
    let text = format!("{title} {body}").to_lowercase();

    let mut hits: Vec<String> = Vec::new();
    for (_, keywords) in DOMAIN_KEYWORDS {
        for kw in *keywords {
            if text.contains(&kw.to_lowercase()) && !hits.iter().any(|h| h == kw) {
                hits.push((*kw).to_string());
            }
        }
    }
    hits
}

/// A note together with its classification
#[derive(Debug, Clone, Serialize)]
pub struct NoteAnalysis {
    pub note: Note,
    pub domains: Vec<String>,
    pub keywords: Vec<String>,
}

/// Classify an extracted note
pub fn analyze(note: Note) -> NoteAnalysis {
    let domains = classify(&note.title, &note.body);
    let keywords = matched_keywords(&note.title, &note.body);
    NoteAnalysis {
        note,
        domains,
        keywords,
    }
}

/// Guidance template for a requested comment style.
///
/// This selects guidance only — the natural-language comment itself is
/// written by the caller and posted via `post_comment`.
pub fn comment_guide(style: &str) -> &'static str {
    match style {
        "引流" => "在评论中自然地提及自己的主页有相关内容，邀请对方关注，语气友好不生硬，不超过两句话。",
        "点赞" => "真诚地夸赞笔记中具体的亮点（地点、做法、细节），避免空洞的彩虹屁，一句话即可。",
        "咨询" => "针对笔记内容提出一个具体的问题（价格、地址、使用感受等），表现出真实的兴趣。",
        "专业" => "以同领域爱好者的口吻补充一条专业见解或经验，展示专业性但不要说教。",
        _ => "",
    }
}
