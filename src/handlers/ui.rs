// src/handlers/ui.rs
use axum::{
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

pub fn ui_routes(static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(chat_page))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(static_dir))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

const CHAT_PAGE: &str = r###"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Avatar Chat</title>
    <style>
        :root { --bg: #0f1117; --panel: #181b24; --muted: #8a8fa3; --accent: #6c7cff; }
        body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: var(--bg); color: #e6e8ef; display: flex; height: 100vh; }
        aside { width: 240px; background: var(--panel); border-right: 1px solid #2a2f3d; display: flex; flex-direction: column; }
        #new-chat-btn { margin: 1rem; background: var(--accent); color: #fff; border: 0; border-radius: 10px; padding: 0.6rem; cursor: pointer; }
        #chat-list { list-style: none; margin: 0; padding: 0 0.5rem; overflow-y: auto; flex: 1; }
        #chat-list li { padding: 0.6rem 0.75rem; border-radius: 8px; cursor: pointer; }
        #chat-list li.active { background: #232736; }
        #chat-list small { color: var(--muted); }
        main { flex: 1; max-width: 820px; margin: 0 auto; display: flex; flex-direction: column; }
        #messages { flex: 1; overflow-y: auto; padding: 1.5rem 1rem; }
        .msg { max-width: 75%; margin: 0.5rem 0; padding: 0.75rem 1rem; border-radius: 12px; white-space: pre-wrap; }
        .msg.user { margin-left: auto; background: var(--accent); }
        .msg.bot { background: var(--panel); }
        .msg video, .msg audio { max-width: 100%; }
        .modes { display: flex; gap: 0.5rem; padding: 0 1rem; }
        .mode-btn { background: var(--panel); color: var(--muted); border: 1px solid #2a2f3d; border-radius: 999px; padding: 0.3rem 0.9rem; cursor: pointer; }
        .mode-btn.active { color: #fff; border-color: var(--accent); }
        form { display: flex; gap: 0.5rem; padding: 1rem; }
        textarea { flex: 1; resize: none; background: var(--panel); color: inherit; border: 1px solid #2a2f3d; border-radius: 10px; padding: 0.75rem; font: inherit; }
        button[type=submit] { background: var(--accent); color: #fff; border: 0; border-radius: 10px; padding: 0 1.25rem; cursor: pointer; }
        #loader-overlay { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.6); display: flex; align-items: center; justify-content: center; font-size: 1.1rem; }
        .hidden { display: none !important; }
    </style>
</head>
<body>
<aside>
    <button id="new-chat-btn">+ New chat</button>
    <ul id="chat-list"></ul>
</aside>
<main>
    <div id="messages"></div>
    <div class="modes">
        <button class="mode-btn active" data-mode="text">Text</button>
        <button class="mode-btn" data-mode="audio">Audio</button>
        <button class="mode-btn" data-mode="video">Video</button>
    </div>
    <form id="prompt-form">
        <textarea id="prompt-input" rows="2" placeholder="Ask anything..."></textarea>
        <button type="submit">Send</button>
    </form>
</main>
<div id="loader-overlay" class="hidden">Rendering avatar...</div>
<script>
    const STORAGE_KEY = "avatarChats";
    const messages = document.getElementById("messages");
    const input = document.getElementById("prompt-input");
    const chatList = document.getElementById("chat-list");
    const loader = document.getElementById("loader-overlay");
    let mode = "text";
    let chats = [];
    let currentId = null;

    function newSession() {
        return { id: "chat_" + Date.now(), title: "New chat", messages: [], createdAt: new Date().toISOString() };
    }

    function save() {
        localStorage.setItem(STORAGE_KEY, JSON.stringify(chats));
    }

    function current() {
        return chats.find(c => c.id === currentId);
    }

    function load() {
        try {
            chats = JSON.parse(localStorage.getItem(STORAGE_KEY)) || [];
        } catch (_) {
            chats = [];
        }
        if (chats.length === 0) {
            chats.push(newSession());
            save();
        }
        currentId = chats[chats.length - 1].id;
        renderList();
        renderMessages();
    }

    function renderList() {
        chatList.innerHTML = "";
        chats.forEach(chat => {
            const li = document.createElement("li");
            li.className = chat.id === currentId ? "active" : "";
            const title = document.createElement("div");
            title.textContent = chat.title;
            const meta = document.createElement("small");
            meta.textContent = new Date(chat.createdAt).toLocaleString([], { month: "short", day: "numeric", hour: "2-digit", minute: "2-digit" });
            li.append(title, meta);
            li.addEventListener("click", () => {
                currentId = chat.id;
                renderList();
                renderMessages();
            });
            chatList.appendChild(li);
        });
    }

    function renderMessages() {
        messages.innerHTML = "";
        (current()?.messages || []).forEach(m => show(m));
    }

    function show(m) {
        const msg = document.createElement("div");
        msg.className = "msg " + m.sender;
        if (m.kind === "audio" || m.kind === "video") {
            const el = document.createElement(m.kind);
            el.controls = true;
            el.src = m.content;
            msg.appendChild(el);
        } else {
            msg.textContent = m.content;
        }
        messages.appendChild(msg);
        messages.scrollTop = messages.scrollHeight;
        return msg;
    }

    function record(sender, kind, content) {
        const m = { sender, kind, content };
        const chat = current();
        if (chat) {
            chat.messages.push(m);
            save();
        }
        show(m);
    }

    document.querySelectorAll(".mode-btn").forEach(btn => btn.addEventListener("click", () => {
        document.querySelectorAll(".mode-btn").forEach(b => b.classList.remove("active"));
        btn.classList.add("active");
        mode = btn.dataset.mode;
    }));

    document.getElementById("new-chat-btn").addEventListener("click", () => {
        const session = newSession();
        chats.push(session);
        currentId = session.id;
        save();
        renderList();
        renderMessages();
        input.focus();
    });

    document.getElementById("prompt-form").addEventListener("submit", async (e) => {
        e.preventDefault();
        const prompt = input.value.trim();
        if (!prompt) return;
        input.value = "";

        const chat = current();
        if (chat && chat.messages.length === 0) {
            chat.title = prompt.length > 30 ? prompt.slice(0, 30) + "..." : prompt;
            renderList();
        }
        record("user", "text", prompt);

        let typing = null;
        if (mode === "video") {
            loader.classList.remove("hidden");
        } else {
            typing = show({ sender: "bot", kind: "text", content: "..." });
        }

        try {
            const res = await fetch("/process", {
                method: "POST",
                headers: { "Content-Type": "application/json" },
                body: JSON.stringify({ prompt, mode })
            });
            const data = await res.json();
            if (data.response) record("bot", "text", data.response);
            if (data.audio_url) record("bot", "audio", data.audio_url);
            if (data.video_url) record("bot", "video", data.video_url);
            if (data.error) record("bot", "text", "Error: " + data.error);
        } catch (err) {
            record("bot", "text", "Failed to connect to server.");
        } finally {
            if (typing) typing.remove();
            loader.classList.add("hidden");
        }
    });

    input.addEventListener("keydown", (e) => {
        if (e.key === "Enter" && !e.shiftKey) {
            e.preventDefault();
            document.getElementById("prompt-form").requestSubmit();
        }
    });

    load();
</script>
</body>
</html>
"###;
