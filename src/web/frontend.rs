//! Embedded HTML/CSS/JS frontend for the transctl dashboard.
//!
//! The entire page is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.
//!
//! Besides rendering, the page is the browser probe: every five seconds it
//! reads the browser's performance APIs and posts them, together with the
//! user interactions seen since the last post, to `/api/browser-metrics`.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="pt">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>transctl Diagnostics</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --orange: #db6d28;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); }
header .subtitle { color: var(--text-muted); font-size: 13px; }

.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(340px, 1fr)); gap: 16px; }
.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
  margin-bottom: 16px;
}
.card h3 { font-size: 15px; margin-bottom: 12px; }
.card h4 { font-size: 14px; margin-bottom: 8px; color: var(--accent); }
.card ul { padding-left: 18px; }

button {
  background: var(--surface);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 6px 12px;
  cursor: pointer;
  font-size: 13px;
}
button:hover { border-color: var(--accent); }
button.primary { background: var(--accent); color: #0d1117; border-color: var(--accent); }
.actions { display: flex; gap: 8px; flex-wrap: wrap; }

textarea, input, select {
  width: 100%;
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 8px;
  font-family: var(--mono);
  font-size: 13px;
  margin-bottom: 8px;
}

.metrics-table { width: 100%; border-collapse: collapse; }
.metrics-table th { text-align: left; padding: 6px 4px; color: var(--text-muted); border-bottom: 1px solid var(--border); }
.metrics-table td { padding: 4px; }
.comparative-box p { margin-bottom: 4px; }

pre.log {
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 8px;
  font-family: var(--mono);
  font-size: 12px;
  white-space: pre-wrap;
  min-height: 60px;
}
.log-error { color: var(--red); font-weight: 600; }
.log-warning { color: var(--yellow); }
.log-info { color: var(--accent); }
.log-debug { color: var(--text-muted); }

.health-indicator { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 6px; }
.health-good { background: var(--green); }
.health-warning { background: var(--yellow); }
.health-error { background: var(--red); }
.health-unknown { background: var(--text-muted); }

.text-green-600 { color: var(--green); }
.text-yellow-600 { color: var(--yellow); }
.text-orange-600 { color: var(--orange); }
.text-red-600 { color: var(--red); }
.font-bold { font-weight: 700; }
#raspberry-pi-status { border: 1px solid var(--red); border-radius: var(--radius); padding: 16px; margin-bottom: 16px; }
#raspberry-pi-status .grid { gap: 4px; }

.toast {
  position: fixed; bottom: 24px; right: 24px;
  background: var(--surface); border: 1px solid var(--border); border-radius: 6px;
  padding: 10px 16px; display: none;
}
.toast.error { border-color: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <div>
      <h1><span class="logo">transctl</span> diagnostics</h1>
      <div class="subtitle">Servidor de tradução e navegador lado a lado</div>
    </div>
    <div id="health"><span class="health-indicator health-unknown"></span>verificando...</div>
  </header>

  <div class="card">
    <div class="actions">
      <button id="btn-start">Iniciar coleta</button>
      <button id="btn-stop">Parar coleta</button>
      <button class="primary" data-export="comparative">Exportar comparativo</button>
      <button data-export="performance">Exportar métricas</button>
      <button data-export="browser">Exportar navegador</button>
      <button data-export="server" id="btn-export-server">Exportar servidor</button>
    </div>
  </div>

  <div id="raspberry-slot"></div>

  <div class="grid">
    <div class="card" id="server-metrics"></div>
    <div class="card" id="client-metrics"></div>
    <div class="card" id="comparative-metrics"></div>
  </div>

  <div class="grid">
    <div class="card"><h3>Memória JS</h3><div id="js-memory-stats">-</div></div>
    <div class="card"><h3>Rede</h3><div id="network-stats">-</div></div>
    <div class="card"><h3>Carregamento</h3><div id="page-load-stats">-</div></div>
    <div class="card"><h3>Recursos</h3><div id="resource-stats">-</div></div>
    <div class="card"><h3>Interações</h3><div id="user-interaction-stats">-</div></div>
  </div>

  <div class="grid">
    <div class="card">
      <h3>Tradução</h3>
      <input id="model-id" placeholder="modelo (ex.: pt-en)">
      <textarea id="source-text" rows="3" placeholder="texto"></textarea>
      <div class="actions"><button class="primary" id="btn-translate">Traduzir</button></div>
      <pre class="log" id="translation"></pre>
    </div>
    <div class="card">
      <h3>Log</h3>
      <textarea id="log-input" rows="5" placeholder="cole linhas de log aqui"></textarea>
      <div class="actions"><button id="btn-format-log">Destacar</button></div>
      <pre class="log" id="log-output"></pre>
    </div>
  </div>
</div>
<div class="toast" id="toast"></div>

<script>
// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body !== undefined) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  if (!res.ok) throw new Error(data.error || res.statusText);
  return data;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast' + (isError ? ' error' : '');
  el.style.display = 'block';
  setTimeout(() => { el.style.display = 'none'; }, 3000);
}

function setHtml(id, html) {
  const el = document.getElementById(id);
  if (el) el.innerHTML = html || '-';
}

function esc(s) {
  const d = document.createElement('div');
  d.textContent = String(s);
  return d.innerHTML;
}

// ---------------------------------------------------------------------------
// Browser probe
// ---------------------------------------------------------------------------

let pendingInteractions = [];
// A fresh id per page load tells the server to restart resource counting.
const PAGE_ID = Date.now().toString(36) + '-' + Math.random().toString(36).slice(2);

function track(kind) {
  return () => pendingInteractions.push({ kind, timestamp: Date.now() });
}

document.addEventListener('click', track('click'));
document.addEventListener('keydown', track('key_press'));
document.addEventListener('scroll', track('scroll'), { passive: true });
document.addEventListener('submit', track('form_submission'));
document.addEventListener('selectionchange', track('text_selection'));
document.addEventListener('input', track('input'));

function readProbe() {
  const snapshot = { pageId: PAGE_ID, interactions: pendingInteractions };
  pendingInteractions = [];

  if (performance.memory) {
    snapshot.heap = {
      used: performance.memory.usedJSHeapSize,
      total: performance.memory.totalJSHeapSize,
      limit: performance.memory.jsHeapSizeLimit,
    };
  }

  const conn = navigator.connection;
  if (conn) {
    snapshot.connection = {
      effectiveType: conn.effectiveType || 'unknown',
      downlinkMbps: conn.downlink,
      rttMs: conn.rtt,
      saveData: !!conn.saveData,
    };
  }

  const t = performance.timing;
  if (t && t.loadEventEnd > 0) {
    snapshot.navigation = {
      navigationStart: t.navigationStart,
      loadEventEnd: t.loadEventEnd,
      domComplete: t.domComplete,
      domInteractive: t.domInteractive,
      responseEnd: t.responseEnd,
      responseStart: t.responseStart,
      connectEnd: t.connectEnd,
      connectStart: t.connectStart,
      domainLookupEnd: t.domainLookupEnd,
      domainLookupStart: t.domainLookupStart,
      redirectEnd: t.redirectEnd,
      redirectStart: t.redirectStart,
    };
  }

  snapshot.clientInfo = {
    userAgent: navigator.userAgent,
    platform: navigator.platform,
    language: navigator.language,
    cookiesEnabled: navigator.cookieEnabled,
    devicePixelRatio: window.devicePixelRatio,
    screenWidth: screen.width,
    screenHeight: screen.height,
    viewportWidth: window.innerWidth,
    viewportHeight: window.innerHeight,
    cpuCores: navigator.hardwareConcurrency,
    deviceMemoryGb: navigator.deviceMemory,
  };

  if (performance.getEntriesByType) {
    snapshot.resources = performance.getEntriesByType('resource').map(r => ({
      initiatorType: r.initiatorType || 'other',
      durationMs: r.duration,
    }));
  }

  return snapshot;
}

async function postProbe() {
  try {
    await api('POST', '/api/browser-metrics', readProbe());
  } catch (e) {
    console.warn('browser metrics post failed', e);
  }
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

async function refreshPanels() {
  try {
    const cmp = await api('GET', '/api/diagnostics/comparative');
    setHtml('server-metrics', cmp.server);
    setHtml('client-metrics', cmp.client);
    setHtml('comparative-metrics', cmp.comparison);

    const client = await api('GET', '/api/diagnostics/client');
    if (client) {
      setHtml('js-memory-stats', client.memory);
      setHtml('network-stats', client.network);
      setHtml('page-load-stats', client.pageLoad);
      setHtml('resource-stats', client.resources);
      setHtml('user-interaction-stats', client.interactions);
    }

    const rpi = await api('GET', '/api/diagnostics/raspberry-pi');
    document.getElementById('raspberry-slot').innerHTML = rpi.html || '';
  } catch (e) {
    console.warn('panel refresh failed', e);
  }
}

async function refreshHealth() {
  try {
    const h = await api('GET', '/api/health');
    const status = h.server_reachable ? 'good' : 'error';
    const label = h.server_reachable
      ? `servidor online (${Math.round(h.latency_ms)} ms)`
      : 'servidor inacessível';
    setHtml('health', `<span class="health-indicator health-${status}"></span>${esc(label)}`);
  } catch (e) {
    setHtml('health', '<span class="health-indicator health-error"></span>dashboard inacessível');
  }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

document.getElementById('btn-start').addEventListener('click', async () => {
  const r = await api('POST', '/api/collection/start');
  toast(r.changed ? 'Coleta iniciada' : 'Coleta já ativa');
});

document.getElementById('btn-stop').addEventListener('click', async () => {
  const r = await api('POST', '/api/collection/stop');
  toast(r.changed ? 'Coleta parada' : 'Coleta já parada');
});

document.querySelectorAll('[data-export]').forEach(btn => {
  btn.addEventListener('click', async () => {
    try {
      const r = await api('POST', '/api/export/' + btn.dataset.export);
      toast('Exportado: ' + r.path);
    } catch (e) {
      toast('Erro ao exportar: ' + e.message, true);
    }
  });
});

document.getElementById('btn-translate').addEventListener('click', async () => {
  const out = document.getElementById('translation');
  out.textContent = '...';
  try {
    const r = await api('POST', '/api/translate', {
      text: document.getElementById('source-text').value,
      modelId: document.getElementById('model-id').value,
    });
    out.textContent = r.translated_text;
  } catch (e) {
    out.innerHTML = '<span class="log-error">' + esc(e.message) + '</span>';
  }
});

document.getElementById('btn-format-log').addEventListener('click', async () => {
  const r = await api('POST', '/api/format-log', {
    text: document.getElementById('log-input').value,
  });
  document.getElementById('log-output').innerHTML = r.html;
});

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------

window.addEventListener('load', () => {
  postProbe().then(refreshPanels);
  refreshHealth();
  setInterval(postProbe, 5000);
  setInterval(refreshPanels, 5000);
  setInterval(refreshHealth, 30000);
});
</script>
</body>
</html>
"##;
