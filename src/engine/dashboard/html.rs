// Chat Relay: Dashboard Page
// Self-contained HTML/JS served at `/`. The page reads its form defaults from
// /api/defaults and its state from /api/state; no secrets are embedded.

pub(super) fn build_dashboard_html(title: &str) -> String {
    let title = escape_html(title);
    format!(r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box}}
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#1e1e1e;color:#cccccc;height:100vh;display:flex}}
.sidebar{{width:320px;background:#252526;border-right:1px solid #3c3c3c;padding:16px;overflow-y:auto;display:flex;flex-direction:column;gap:10px}}
.sidebar h2{{font-size:13px;text-transform:uppercase;letter-spacing:.05em;color:#9146ff;margin-top:8px}}
.sidebar label{{font-size:12px;color:#999;display:flex;flex-direction:column;gap:4px}}
.sidebar label.toggle{{flex-direction:row;align-items:center;gap:8px;color:#ccc}}
.sidebar input[type=text],.sidebar input[type=password],.sidebar select{{padding:7px 10px;border:1px solid #3c3c3c;border-radius:6px;background:#313131;color:#cccccc;font-size:13px;outline:none}}
.sidebar input:focus,.sidebar select:focus{{border-color:#9146ff}}
.hint{{font-size:11px;color:#777}}
.main{{flex:1;display:flex;flex-direction:column;min-width:0}}
.header{{padding:16px 20px;background:#252526;border-bottom:1px solid #3c3c3c;display:flex;align-items:center;gap:12px}}
.header h1{{font-size:16px;font-weight:600;color:#9146ff;flex:1}}
.dot{{width:8px;height:8px;border-radius:50%;background:#f44;transition:background .3s}}
.dot.online{{background:#0f0}}
.cards{{display:flex;gap:12px;padding:16px 20px;flex-wrap:wrap}}
.card{{flex:1;min-width:140px;background:#252526;border:1px solid #3c3c3c;border-radius:8px;padding:12px}}
.card .label{{font-size:12px;color:#999}}
.card .value{{font-size:22px;font-weight:600;margin-top:4px}}
.actions{{display:flex;gap:8px;padding:0 20px 12px}}
button{{padding:8px 16px;background:#9146ff;color:#fff;border:none;border-radius:6px;font-weight:600;cursor:pointer}}
button.secondary{{background:#3c3c3c}}
button.stop{{background:#c33}}
.notice{{margin:0 20px 12px;padding:8px 12px;border-radius:6px;font-size:13px;display:none}}
.notice.error{{display:block;background:#4a1f1f;color:#f88}}
.messages{{flex:1;overflow-y:auto;padding:0 20px 20px;display:flex;flex-direction:column;gap:8px}}
.msg{{padding:8px 12px;border-radius:8px;font-size:14px;line-height:1.5;word-wrap:break-word;white-space:pre-wrap;background:#252526;border:1px solid #3c3c3c}}
.msg .meta{{font-size:11px;color:#888;margin-bottom:2px}}
.msg .author{{font-weight:600;color:#ccc}}
.msg.system{{color:#888;font-style:italic;font-size:13px}}
.msg.translation{{border-color:#1e6fd933;background:#1d2633}}
.msg.ai-reply{{border-color:#9146ff55;background:#2a2238}}
.empty{{color:#777;font-size:13px;text-align:center;margin-top:40px}}
.guide{{display:flex;gap:16px;flex-wrap:wrap;font-size:13px;line-height:1.6}}
.guide section{{flex:1;min-width:240px;background:#252526;border:1px solid #3c3c3c;border-radius:8px;padding:12px 16px}}
.guide h3{{font-size:14px;color:#9146ff;margin-bottom:6px}}
.guide ol{{padding-left:18px}}
.guide a{{color:#bf94ff}}
.guide code{{background:#313131;padding:0 4px;border-radius:3px}}
</style>
</head>
<body>
<form class="sidebar" id="form" autocomplete="off">
  <h2>Twitch</h2>
  <label>Channel<input type="text" id="channel" placeholder="channel name"></label>
  <label>OAuth token<input type="password" id="oauth_token" placeholder="oauth:..."></label>
  <span class="hint" id="token_hint"></span>
  <label>Bot username<input type="text" id="bot_username"></label>
  <h2>AI replies</h2>
  <label class="toggle"><input type="checkbox" id="ai_enabled"> Enable AI replies</label>
  <label>Groq API key<input type="password" id="groq_api_key" placeholder="gsk_..."></label>
  <span class="hint" id="groq_hint"></span>
  <h2>Translation</h2>
  <label class="toggle"><input type="checkbox" id="translation_enabled"> Enable translation</label>
  <label>Target language<select id="target_language"></select></label>
  <h2>Persona</h2>
  <label>Nickname<input type="text" id="p_nickname"></label>
  <label>Bio<input type="text" id="p_bio"></label>
  <label>Style<input type="text" id="p_style"></label>
  <label>Current game<input type="text" id="p_game"></label>
  <label>CPU<input type="text" id="p_cpu"></label>
  <label>GPU<input type="text" id="p_gpu"></label>
</form>
<div class="main">
  <div class="header"><div class="dot" id="dot"></div><h1>{title}</h1><span id="status">Stopped</span></div>
  <div class="cards">
    <div class="card" title="Viewer chat lines; system notices are not counted"><div class="label">Chat Messages</div><div class="value" id="c_messages">0</div></div>
    <div class="card"><div class="label">Translations</div><div class="value" id="c_translations">0</div></div>
    <div class="card"><div class="label">AI Responses</div><div class="value" id="c_ai">0</div></div>
    <div class="card"><div class="label">Status</div><div class="value" id="c_status">Stopped</div></div>
  </div>
  <div class="actions">
    <button id="toggle">Start</button>
    <button class="secondary" id="clear">Clear</button>
    <button class="secondary" id="refresh">Refresh</button>
  </div>
  <div class="notice" id="notice"></div>
  <div class="messages" id="messages"></div>
  <template id="guide">
    <div class="guide">
      <section>
        <h3>Get credentials</h3>
        <ol>
          <li>Twitch OAuth token (required): open <a href="https://twitchapps.com/tmi/" target="_blank" rel="noopener">twitchapps.com/tmi</a>, log in with the bot account, click Connect and copy the token (starts with <code>oauth:</code>).</li>
          <li>Groq API key (optional, for AI replies): sign up at <a href="https://console.groq.com" target="_blank" rel="noopener">console.groq.com</a>, create a key and copy it (starts with <code>gsk_</code>).</li>
        </ol>
      </section>
      <section>
        <h3>Quick start</h3>
        <ol>
          <li>Fill in the Twitch fields, the optional Groq key, translation and persona in the sidebar.</li>
          <li>Press Start and wait for "Connected to Twitch".</li>
          <li>Write in your channel's chat and watch the line, its translation and the AI reply appear here.</li>
        </ol>
      </section>
      <section>
        <h3>Tips</h3>
        <ol>
          <li>Make the bot account a moderator in your channel.</li>
          <li>The page refreshes every 2 seconds while running.</li>
          <li>AI replies are posted back to chat automatically.</li>
        </ol>
      </section>
    </div>
  </template>
</div>
<script>
const $=id=>document.getElementById(id);
let running=false,timer=null;
const persona=['nickname','bio','style','game','cpu','gpu'];
function esc(s){{const d=document.createElement('div');d.textContent=s==null?'':String(s);return d.innerHTML}}
function notice(msg){{const n=$('notice');if(msg){{n.textContent=msg;n.className='notice error'}}else{{n.textContent='';n.className='notice'}}}}
async function api(method,path,body){{
  const opts={{method,headers:{{}}}};
  if(method==='POST'){{opts.headers['Content-Type']='application/json';opts.body=JSON.stringify(body===undefined?{{}}:body)}}
  const r=await fetch(path,opts);
  return r.json();
}}
async function loadDefaults(){{
  const d=await api('GET','/api/defaults');
  const f=d.defaults;
  $('channel').value=f.channel;$('bot_username').value=f.bot_username;
  $('ai_enabled').checked=f.ai_enabled;$('translation_enabled').checked=f.translation_enabled;
  const sel=$('target_language');
  sel.innerHTML=d.languages.map(l=>'<option value="'+esc(l.code)+'">'+esc(l.label)+'</option>').join('');
  sel.value=f.target_language;
  persona.forEach(k=>$('p_'+k).value=f.persona[k]);
  if(d.env_secrets.oauth_token)$('token_hint').textContent='Leave blank to use the token from the environment';
  if(d.env_secrets.groq_api_key)$('groq_hint').textContent='Leave blank to use the key from the environment';
}}
function formConfig(){{
  const p={{}};persona.forEach(k=>p[k]=$('p_'+k).value);
  return {{
    channel:$('channel').value,oauth_token:$('oauth_token').value,bot_username:$('bot_username').value,
    ai_enabled:$('ai_enabled').checked,groq_api_key:$('groq_api_key').value,
    translation_enabled:$('translation_enabled').checked,target_language:$('target_language').value,persona:p
  }};
}}
function render(s){{
  running=s.state==='running';
  const label=running?'Running':'Stopped';
  $('dot').className=running?'dot online':'dot';
  $('status').textContent=label;$('c_status').textContent=label;
  $('c_messages').textContent=s.counters.messages;
  $('c_translations').textContent=s.counters.translations;
  $('c_ai').textContent=s.counters.ai_replies;
  const t=$('toggle');t.textContent=running?'Stop':'Start';t.className=running?'stop':'';
  const box=$('messages');
  if(!s.records.length){{
    box.innerHTML=running?'<div class="empty">No messages yet</div>':$('guide').innerHTML;
    return;
  }}
  box.innerHTML=s.records.map(r=>{{
    const to=r.reply_to?' → @'+esc(r.reply_to):'';
    return '<div class="msg '+esc(r.kind)+'"><div class="meta">'+esc(r.time)+' <span class="author">'+esc(r.author)+'</span>'+to+'</div>'+esc(r.text)+'</div>';
  }}).join('');
}}
async function refresh(){{
  clearTimeout(timer);timer=null;
  try{{
    const s=await api('GET','/api/state');
    render(s);
    if(s.refresh_ms)timer=setTimeout(refresh,s.refresh_ms);
  }}catch(e){{notice('Dashboard unreachable: '+e)}}
}}
$('toggle').onclick=async()=>{{
  notice('');
  const r=running?await api('POST','/api/stop'):await api('POST','/api/start',formConfig());
  if(!r.ok)notice(r.error);
  refresh();
}};
$('clear').onclick=async()=>{{await api('POST','/api/clear');refresh()}};
$('refresh').onclick=refresh;
$('form').onsubmit=e=>e.preventDefault();
loadDefaults().catch(e=>notice('Could not load defaults: '+e));
refresh();
</script>
</body>
</html>"##)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
