use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>PDF Chatbot</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 0; background: #f9fafb; color: #1f2937; }
    header { background: #fff; box-shadow: 0 1px 2px rgba(0,0,0,0.05); padding: 1rem; }
    main { max-width: 56rem; margin: 2rem auto; padding: 0 1rem; }
    .card { background: #fff; border-radius: 8px; box-shadow: 0 1px 4px rgba(0,0,0,0.1); padding: 1.5rem; margin-bottom: 1.5rem; }
    .upload { border: 2px dashed #d1d5db; border-radius: 8px; padding: 1.5rem; text-align: center; }
    #messages { height: 400px; overflow-y: auto; display: flex; flex-direction: column; gap: 1rem; }
    .msg { max-width: 80%; padding: 0.75rem; border-radius: 8px; font-size: 0.9rem; }
    .system { align-self: flex-start; background: #dbeafe; }
    .user { align-self: flex-end; background: #f3f4f6; }
    form { display: flex; gap: 0.5rem; border-top: 1px solid #e5e7eb; padding-top: 1rem; margin-top: 1rem; }
    input[type=text] { flex: 1; padding: 0.5rem 1rem; border: 1px solid #d1d5db; border-radius: 6px; }
    button { padding: 0.5rem 1rem; background: #2563eb; color: #fff; border: 0; border-radius: 6px; cursor: pointer; }
    button:disabled, input:disabled { opacity: 0.5; cursor: default; }
  </style>
</head>
<body>
  <header><h1>PDF Chatbot</h1></header>
  <main>
    <div class="card">
      <div class="upload">
        <input id="fileInput" type="file" accept=".pdf,application/pdf" hidden />
        <button id="uploadBtn">Upload PDF</button>
      </div>
    </div>

    <div class="card">
      <div id="messages"></div>
      <form id="askForm">
        <input id="question" type="text" placeholder="Ask a question about the PDF..." disabled />
        <button id="sendBtn" type="submit" disabled>Send</button>
      </form>
    </div>
  </main>

  <script>
    const fileInput = document.getElementById('fileInput');
    const uploadBtn = document.getElementById('uploadBtn');
    const questionInput = document.getElementById('question');
    const sendBtn = document.getElementById('sendBtn');
    const messagesEl = document.getElementById('messages');
    let sessionId = null;
    let documentLoaded = false;
    let busy = false;

    function render(messages) {
      messagesEl.innerHTML = '';
      for (const m of messages) {
        const div = document.createElement('div');
        div.className = 'msg ' + (m.isFromSystem ? 'system' : 'user');
        div.textContent = m.text;
        messagesEl.appendChild(div);
      }
      messagesEl.scrollTop = messagesEl.scrollHeight;
    }

    function refreshControls() {
      uploadBtn.disabled = busy;
      uploadBtn.textContent = busy ? 'Processing...' : 'Upload PDF';
      questionInput.disabled = busy || !documentLoaded;
      sendBtn.disabled = busy || !documentLoaded || !questionInput.value.trim();
      sendBtn.textContent = busy ? 'Processing...' : 'Send';
    }

    async function ensureSession() {
      if (sessionId) return sessionId;
      const res = await fetch('/api/sessions', { method: 'POST' });
      const json = await res.json();
      sessionId = json.sessionId;
      return sessionId;
    }

    uploadBtn.addEventListener('click', () => fileInput.click());
    questionInput.addEventListener('input', refreshControls);

    fileInput.addEventListener('change', async () => {
      const file = fileInput.files[0];
      if (!file) return;
      busy = true; refreshControls();
      try {
        const id = await ensureSession();
        const formData = new FormData();
        formData.append('file', file);
        const res = await fetch(`/api/sessions/${id}/document`, { method: 'POST', body: formData });
        const json = await res.json();
        if (json.messages) {
          render(json.messages);
          // A failed upload keeps the previous document; a text-less one replaces it
          documentLoaded = json.pages === undefined ? documentLoaded : json.documentLoaded;
        } else {
          render([{ text: 'Error processing PDF. Please try again.', isFromSystem: true }]);
        }
      } catch (err) {
        console.error('Error uploading PDF:', err);
        render([{ text: 'Error processing PDF. Please try again.', isFromSystem: true }]);
      } finally {
        busy = false; fileInput.value = ''; refreshControls();
      }
    });

    document.getElementById('askForm').addEventListener('submit', async (e) => {
      e.preventDefault();
      const question = questionInput.value;
      busy = true; refreshControls();
      try {
        const id = await ensureSession();
        const res = await fetch(`/api/sessions/${id}/messages`, {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ question })
        });
        const json = await res.json();
        if (json.messages) render(json.messages);
      } catch (err) {
        console.error('Error getting answer:', err);
      } finally {
        busy = false; questionInput.value = ''; refreshControls();
      }
    });

    refreshControls();
  </script>
</body>
</html>"#)
}
